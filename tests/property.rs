//! Property-based tests for queue draining, ping detection and the gzip codec.

use proptest::prelude::*;
use wsfeed::codec::gzip_compress;
use wsfeed::{Decompress, Gzip, OutboundQueue, PingConfig, PingDetector, PingMatch};

fn detector(matching: PingMatch) -> PingDetector {
    PingDetector::new(PingConfig {
        matching,
        ..PingConfig::default()
    })
}

fn template_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9]{1,12}", 0..20)
}

proptest! {
    #[test]
    fn test_queue_never_underflows(template in template_strategy(), cycles in 0usize..40) {
        let mut queue = OutboundQueue::new(template.clone());
        for _ in 0..cycles {
            queue.pop_next();
        }
        prop_assert_eq!(queue.remaining(), template.len().saturating_sub(cycles));
    }

    #[test]
    fn test_reseed_restores_template(template in template_strategy(), cycles in 0usize..40) {
        let mut queue = OutboundQueue::new(template.clone());
        for _ in 0..cycles {
            queue.pop_next();
        }
        queue.reseed();

        let pending: Vec<String> = queue.pending().map(str::to_string).collect();
        prop_assert_eq!(pending, template);
    }

    #[test]
    fn test_structured_pong_echoes_value(value in any::<u64>()) {
        let text = format!(r#"{{"ping": {value}}}"#);
        let pong = detector(PingMatch::Structured).detect(&text);
        prop_assert_eq!(pong.map(|p| p.to_text()), Some(format!(r#"{{"pong": {value}}}"#)));
    }

    #[test]
    fn test_structured_pong_echoes_number_text(
        value in "-?(0|[1-9][0-9]{0,30})(\\.[0-9]{1,10})?([eE][+-]?[0-9]{1,3})?"
    ) {
        let text = format!(r#"{{"ping": {value}}}"#);
        let pong = detector(PingMatch::Structured).detect(&text);
        prop_assert_eq!(pong.map(|p| p.value().to_string()), Some(value));
    }

    #[test]
    fn test_substring_pong_echoes_value(value in any::<u64>(), pad in " {0,3}") {
        let text = format!(r#"{{"ping":{pad}{value}{pad}}}"#);
        let pong = detector(PingMatch::Substring).detect(&text);
        prop_assert_eq!(pong.map(|p| p.value().to_string()), Some(value.to_string()));
    }

    #[test]
    fn test_text_without_key_is_never_ping(text in "[a-z{}\":, 0-9]{0,64}") {
        prop_assume!(!text.contains("ping"));
        prop_assert!(detector(PingMatch::Structured).detect(&text).is_none());
        prop_assert!(detector(PingMatch::Substring).detect(&text).is_none());
    }

    #[test]
    fn test_detection_is_deterministic(text in ".{0,64}") {
        let detector = detector(PingMatch::Structured);
        prop_assert_eq!(detector.detect(&text), detector.detect(&text));
    }

    #[test]
    fn test_gzip_roundtrip(text in ".{0,512}") {
        let compressed = gzip_compress(text.as_bytes()).unwrap();
        prop_assert_eq!(Gzip::default().decompress(&compressed).unwrap(), text);
    }
}
