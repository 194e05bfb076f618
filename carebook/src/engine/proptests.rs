//! Property-based tests driving random transition sequences through the
//! engine.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use super::test_util::{booking, seeded_engine};
use crate::database::test_util::day;
use crate::notify::RecordingSink;
use crate::status::{ReservationStatus, Transition};

fn transition_strategy() -> impl Strategy<Value = Transition> {
    prop_oneof![
        Just(Transition::Approve),
        Just(Transition::Reject),
        Just(Transition::Cancel),
        Just(Transition::Annul),
        Just(Transition::Complete),
        Just(Transition::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        .. ProptestConfig::default()
    })]

    #[test]
    fn engine_follows_transition_table(
        steps in prop::collection::vec(transition_strategy(), 1..8),
        days in 1u32..6,
    ) {
        let sink = Arc::new(RecordingSink::new());
        let mut engine = seeded_engine(Arc::clone(&sink));
        let id = engine.create(booking(day(2024, 3, 1), day(2024, 3, days))).unwrap().id();
        let after_range = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();

        let mut model = Some(ReservationStatus::Pending);
        let mut notifications = 0;

        for step in steps {
            let result = match step {
                Transition::Approve => engine.approve(id).map(|_| ()),
                Transition::Reject => engine.reject(id).map(|_| ()),
                Transition::Cancel => engine.cancel(id).map(|_| ()),
                Transition::Annul => engine.annul(id).map(|_| ()),
                Transition::Complete => engine.complete(id, after_range).map(|_| ()),
                Transition::Delete => engine.delete(id),
            };

            match model {
                None => prop_assert!(result.unwrap_err().is_not_found()),
                Some(current) if step.allowed_from(current) => {
                    prop_assert!(result.is_ok(), "{step} from {current}: {result:?}");
                    model = step.target();
                    if model.is_some() {
                        notifications += 1;
                    }
                }
                Some(current) => {
                    let err = result.unwrap_err();
                    prop_assert_eq!(err.kind(), crate::ErrorKind::InvalidTransition, "{} from {}", step, current);
                }
            }

            match model {
                Some(status) => {
                    let stored = engine.get(id).unwrap();
                    prop_assert_eq!(stored.status(), status);
                    let live = engine.slots_for(id).unwrap().iter().filter(|s| !s.deleted).count();
                    prop_assert_eq!(stored.slot_count() as usize, live);
                    let released = matches!(
                        status,
                        ReservationStatus::Rejected | ReservationStatus::Cancelled | ReservationStatus::Annulled
                    );
                    prop_assert_eq!(live == 0, released);
                }
                None => prop_assert!(engine.get(id).unwrap_err().is_not_found()),
            }
        }

        prop_assert_eq!(sink.events().len(), notifications);
    }
}
