//! Card identifier reconstruction
//!
//! Card ids are derived from `(set id, ordinal)` rather than taken from the
//! source. Most sets use `"{set}-{ordinal}"`; promo and subset collections
//! print a prefixed, zero-padded number instead. Those exceptions are catalog
//! data, listed in [`ID_EXCEPTIONS`].

/// Numbering override for one set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdException {
    /// Text placed between `"{set}-"` and the number
    pub prefix: &'static str,
    /// Zero-padded width of the number; 0 means no padding
    pub width: usize,
}

const fn exception(prefix: &'static str, width: usize) -> IdException {
    IdException { prefix, width }
}

/// Sets whose printed numbers do not follow `"{set}-{ordinal}"`
pub const ID_EXCEPTIONS: &[(&str, IdException)] = &[
    ("swshp", exception("SWSH", 3)),
    ("smp", exception("SM", 2)),
    ("xyp", exception("XY", 2)),
    ("bwp", exception("BW", 2)),
    ("hsp", exception("HGSS", 2)),
    ("dpp", exception("DP", 2)),
    ("swsh45sv", exception("SV", 3)),
    ("sma", exception("SV", 0)),
    ("swsh9tg", exception("TG", 2)),
    ("swsh10tg", exception("TG", 2)),
    ("swsh11tg", exception("TG", 2)),
    ("swsh12tg", exception("TG", 2)),
    ("swsh12pt5gg", exception("GG", 2)),
];

/// Look up the numbering override for a set, if any
pub fn exception_for(set_id: &str) -> Option<IdException> {
    ID_EXCEPTIONS
        .iter()
        .find(|(id, _)| *id == set_id)
        .map(|(_, rule)| *rule)
}

/// Canonical card id for the `ordinal`-th card (1-based) of `set_id`
pub fn resolve(set_id: &str, ordinal: u32) -> String {
    match exception_for(set_id) {
        Some(rule) => format!(
            "{}-{}{:0width$}",
            set_id,
            rule.prefix,
            ordinal,
            width = rule.width
        ),
        None => format!("{}-{}", set_id, ordinal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule() {
        assert_eq!(resolve("base1", 4), "base1-4");
        assert_eq!(resolve("sv3pt5", 151), "sv3pt5-151");
    }

    #[test]
    fn test_documented_examples() {
        assert_eq!(resolve("swshp", 7), "swshp-SWSH007");
        assert_eq!(resolve("smp", 1), "smp-SM01");
        assert_eq!(resolve("hsp", 25), "hsp-HGSS25");
        assert_eq!(resolve("swsh45sv", 94), "swsh45sv-SV094");
        assert_eq!(resolve("swsh11tg", 3), "swsh11tg-TG03");
        assert_eq!(resolve("swsh12pt5gg", 70), "swsh12pt5gg-GG70");
    }

    #[test]
    fn test_unpadded_exception() {
        assert_eq!(resolve("sma", 5), "sma-SV5");
        assert_eq!(resolve("sma", 94), "sma-SV94");
    }

    #[test]
    fn test_padding_does_not_truncate() {
        assert_eq!(resolve("smp", 248), "smp-SM248");
        assert_eq!(resolve("swshp", 1234), "swshp-SWSH1234");
    }

    #[test]
    fn test_every_exception_uses_its_prefix_and_width() {
        for (set_id, rule) in ID_EXCEPTIONS {
            let id = resolve(set_id, 1);
            let expected_number = if rule.width == 0 {
                "1".to_string()
            } else {
                format!("{}1", "0".repeat(rule.width - 1))
            };
            assert_eq!(id, format!("{}-{}{}", set_id, rule.prefix, expected_number));
        }
    }

    #[test]
    fn test_exception_lookup_is_exact() {
        assert!(exception_for("swshp").is_some());
        assert!(exception_for("swsh").is_none());
        assert!(exception_for("SWSHP").is_none());
    }
}
