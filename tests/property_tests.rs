//! Property-based tests for bitmask_logger using proptest

use bitmask_logger::core::{interpolate, LevelTable, Record, WriterBinding};
use bitmask_logger::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

fn any_level() -> impl Strategy<Value = Level> {
    prop::sample::select(Level::ALL.to_vec())
}

fn key() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_.]{0,8}"
}

fn plain_formatter() -> Formatter {
    Arc::new(|_: &str, message: &str, _: &LogContext| message.to_string())
}

// ============================================================================
// LevelTable Tests
// ============================================================================

proptest! {
    /// Every standard level name resolves to its bit, in any letter case
    #[test]
    fn test_level_name_roundtrip(level in any_level(), upper in any::<bool>()) {
        let table = LevelTable::new();
        let name = if upper {
            level.as_str().to_uppercase()
        } else {
            level.as_str().to_string()
        };

        let id = table.resolve(&name).unwrap();
        prop_assert_eq!(id, level.id());
        prop_assert_eq!(table.name(id), Some(level.as_str()));
        prop_assert_eq!(id.bits().count_ones(), 1);
    }

    /// Custom levels take consecutive bits above the standard eight
    #[test]
    fn test_custom_levels_get_increasing_bits(
        names in prop::collection::hash_set("[a-z]{3,10}_lvl", 1..20)
    ) {
        let mut table = LevelTable::new();
        let mut previous = Level::Emergency.id().bits();

        for name in &names {
            let id = table.extend(name).unwrap();
            prop_assert_eq!(id.bits(), previous << 1);
            prop_assert_eq!(table.resolve(name), Some(id));
            previous = id.bits();
        }
        prop_assert_eq!(table.len(), 8 + names.len());
        prop_assert_eq!(table.all().bits().count_ones() as usize, table.len());
    }

    /// Level mask algebra: enable then disable restores the original mask
    #[test]
    fn test_enable_disable_algebra(start in any::<u64>(), toggle in any::<u64>()) {
        let mut logger = Logger::standalone("algebra");
        logger.disable(LevelMask::ALL).unwrap();
        logger.enable(LevelMask::from_bits(start)).unwrap();
        prop_assert_eq!(logger.enabled().bits(), start);

        logger.enable(LevelMask::from_bits(toggle)).unwrap();
        prop_assert_eq!(logger.enabled().bits(), start | toggle);

        logger.disable(LevelMask::from_bits(toggle)).unwrap();
        prop_assert_eq!(logger.enabled().bits(), start & !toggle);
    }

    /// A level logs exactly when its bit is enabled
    #[test]
    fn test_filter_matches_mask(enabled in 0u64..=0xff, level in any_level()) {
        let mut logger = Logger::standalone("filter");
        logger.bind_memory(BindOptions::new()).unwrap();
        logger.disable(LevelMask::ALL).unwrap();
        logger.enable(LevelMask::from_bits(enabled)).unwrap();

        logger.log(level, "x", LogContext::new()).unwrap();
        let expected = enabled & level.id().bits() != 0;
        prop_assert_eq!(logger.logs().len(), usize::from(expected));
    }
}

// ============================================================================
// Interpolation Tests
// ============================================================================

proptest! {
    /// A template without `{` is returned unchanged
    #[test]
    fn test_template_without_braces_unchanged(template in "[^{]*", k in key(), v in ".*") {
        let ctx = LogContext::new().with_field(k, v);
        prop_assert_eq!(interpolate(&template, &ctx), template);
    }

    /// A placeholder whose key is missing stays verbatim
    #[test]
    fn test_missing_key_left_verbatim(prefix in "[a-z ]{0,10}", k in key()) {
        let template = format!("{}{{{}}}", prefix, k);
        prop_assert_eq!(interpolate(&template, &LogContext::new()), template);
    }

    /// String values are substituted as is and never rescanned
    #[test]
    fn test_string_value_substituted(k in key(), v in ".*") {
        let template = format!("<{{{}}}>", k);
        let ctx = LogContext::new().with_field(k, v.clone());
        prop_assert_eq!(interpolate(&template, &ctx), format!("<{}>", v));
    }

    /// Integers render in decimal
    #[test]
    fn test_integer_value_substituted(k in key(), n in any::<i64>()) {
        let template = format!("n={{{}}}", k);
        let ctx = LogContext::new().with_field(k, n);
        prop_assert_eq!(interpolate(&template, &ctx), format!("n={}", n));
    }

    /// Aggregate values are never rendered
    #[test]
    fn test_list_value_left_verbatim(k in key(), items in prop::collection::vec(any::<i64>(), 0..5)) {
        let template = format!("{{{}}}", k);
        let list = FieldValue::List(items.into_iter().map(FieldValue::Int).collect());
        let ctx = LogContext::new().with_field(k, list);
        prop_assert_eq!(interpolate(&template, &ctx), template);
    }
}

// ============================================================================
// Batching Tests
// ============================================================================

proptest! {
    /// A batched binding emits `count / interval` full batches and buffers the rest
    #[test]
    fn test_batch_counts(interval in 1usize..10, count in 0usize..50) {
        let mut binding = WriterBinding::new((), plain_formatter(), LevelMask::ALL, interval).unwrap();
        let mut emitted = Vec::new();

        for i in 0..count {
            let record = Record {
                level: Level::Info.id(),
                level_name: "info".to_string(),
                message: i.to_string(),
                context: LogContext::new(),
            };
            emitted.extend(binding.accept(&record));
        }

        if interval == 1 {
            prop_assert_eq!(emitted.len(), count);
            prop_assert!(emitted.iter().all(|p| !p.is_batch()));
        } else {
            prop_assert_eq!(emitted.len(), count / interval);
            prop_assert!(emitted.iter().all(|p| p.len() == interval));
            prop_assert_eq!(binding.buffered(), count % interval);
        }

        // Order is preserved across batches and the final drain
        let mut records: Vec<String> = emitted.into_iter().flat_map(Payload::into_records).collect();
        if let Some(rest) = binding.drain() {
            records.extend(rest.into_records());
        }
        let expected: Vec<String> = (0..count).map(|i| i.to_string()).collect();
        prop_assert_eq!(records, expected);
    }

    /// Closing a logger delivers every qualifying record exactly once
    #[test]
    fn test_close_delivers_everything(interval in 1usize..8, count in 0usize..40) {
        let mut logger = Logger::standalone("batches");
        logger
            .bind_memory(BindOptions::new().interval(interval).formatter(plain_formatter()))
            .unwrap();

        for i in 0..count {
            logger.log("info", i.to_string(), LogContext::new()).unwrap();
        }
        prop_assert_eq!(logger.logs().len(), count - count % interval);

        let logs = logger.close().unwrap();
        prop_assert_eq!(logs.len(), count);
    }
}
