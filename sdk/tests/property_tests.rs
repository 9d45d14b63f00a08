use proptest::prelude::*;
use sdk::errors::{DocketErrorExt, EngineError};
use sdk::{CapabilityOutput, Priority, TaskContext};

proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::UnknownProvider(error_str.clone()),
            EngineError::MissingApiKey(error_str.clone()),
            EngineError::DuplicateCapability(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());

            // Hints are static text and never echo the raw detail back
            if error_str.len() > 12 {
                prop_assert!(!hint.contains(&error_str));
            }
        }
    }
}

proptest! {
    #[test]
    fn test_confidence_always_in_unit_range(value in -1.0e6..1.0e6f64) {
        let out = CapabilityOutput::default().with_confidence(value);
        let confidence = out.confidence.unwrap();
        prop_assert!((0.0..=1.0).contains(&confidence));
    }

    #[test]
    fn test_actions_preserve_order(actions in prop::collection::vec("[a-z]{1,12}", 0..8)) {
        let out = actions
            .iter()
            .fold(CapabilityOutput::default(), |out, action| out.with_action(action.clone()));
        prop_assert_eq!(out.actions, actions);
    }

    #[test]
    fn test_task_context_json_round_trip(
        task_type in "[a-z_]{1,24}",
        priority in prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)],
        note in "\\PC{0,40}",
    ) {
        let ctx = TaskContext::new(task_type, priority, note);
        let json = serde_json::to_string(&ctx).unwrap();
        let parsed: TaskContext = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(ctx, parsed);
    }
}
