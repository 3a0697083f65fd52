mod common;

use chrono::Weekday;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tutorsync_core::{
    errors::ScheduleError,
    models::{
        relationship::RelationshipStatus,
        schedule::{OccurrenceState, ScheduleOccurrence},
        time_slot::{CreateTemplateRequest, UpdateTemplateRequest},
    },
    store::TemplateStore,
};
use tutorsync_scheduler::config::{ConflictPolicy, TemplateEditPolicy};
use uuid::Uuid;

use common::{date, quiet_notifier, time, Fixture};

fn create_request(relationship_id: Uuid, weekday: i16, start: (u32, u32), end: (u32, u32)) -> CreateTemplateRequest {
    CreateTemplateRequest {
        relationship_id,
        weekday,
        start_time: time(start.0, start.1),
        end_time: time(end.0, end.1),
    }
}

#[tokio::test]
async fn test_create_template() {
    let fx = Fixture::new().await;
    let manager = fx.template_manager(TemplateEditPolicy::RegenerateFutureOnly);

    let template = manager
        .create(create_request(fx.relationship.id, 1, (14, 0), (15, 0)))
        .await
        .unwrap();

    assert_eq!(template.weekday, Weekday::Mon);
    assert!(template.is_active);
    let stored = fx.store.get_template(template.id).await.unwrap();
    assert_eq!(stored, Some(template));
}

#[rstest]
#[case::weekday_out_of_range(7, (14, 0), (15, 0))]
#[case::negative_weekday(-1, (14, 0), (15, 0))]
#[case::end_before_start(1, (15, 0), (14, 0))]
#[case::zero_length(1, (14, 0), (14, 0))]
#[case::shorter_than_minimum(1, (14, 0), (14, 29))]
#[tokio::test]
async fn test_create_rejects_invalid_slots(#[case] weekday: i16, #[case] start: (u32, u32), #[case] end: (u32, u32)) {
    let fx = Fixture::new().await;
    let manager = fx.template_manager(TemplateEditPolicy::RegenerateFutureOnly);

    let result = manager
        .create(create_request(fx.relationship.id, weekday, start, end))
        .await;

    assert!(matches!(result, Err(ScheduleError::Validation(_))));
}

#[tokio::test]
async fn test_create_rejects_overlap_with_same_tutor() {
    let fx = Fixture::new().await;
    let other = fx.another_student("Other").await;
    let manager = fx.template_manager(TemplateEditPolicy::RegenerateFutureOnly);
    manager
        .create(create_request(fx.relationship.id, 1, (14, 0), (15, 0)))
        .await
        .unwrap();

    let overlapping = manager
        .create(create_request(other.id, 1, (14, 30), (15, 30)))
        .await;
    let touching = manager.create(create_request(other.id, 1, (15, 0), (16, 0))).await;
    let other_day = manager.create(create_request(other.id, 2, (14, 30), (15, 30))).await;

    assert!(matches!(overlapping, Err(ScheduleError::Conflict(_))));
    assert!(touching.is_ok());
    assert!(other_day.is_ok());
}

#[tokio::test]
async fn test_create_requires_open_relationship() {
    let fx = Fixture::new().await;
    let manager = fx.template_manager(TemplateEditPolicy::RegenerateFutureOnly);

    let unknown = manager
        .create(create_request(Uuid::new_v4(), 1, (14, 0), (15, 0)))
        .await;
    fx.store
        .set_relationship_status(fx.relationship.id, RelationshipStatus::Ended)
        .await;
    let ended = manager
        .create(create_request(fx.relationship.id, 1, (14, 0), (15, 0)))
        .await;

    assert!(matches!(unknown, Err(ScheduleError::NotFound(_))));
    assert!(matches!(ended, Err(ScheduleError::Validation(_))));
}

async fn generated_fixture() -> (Fixture, Uuid) {
    let fx = Fixture::new().await;
    let template = fx
        .add_template(fx.relationship.id, Weekday::Mon, time(14, 0), time(15, 0))
        .await;
    fx.store
        .add_occurrence(ScheduleOccurrence::from_template(
            &template,
            date(2023, 12, 25),
            tutorsync_scheduler::clock::Clock::now(fx.clock.as_ref()),
        ))
        .await;
    fx.generator(quiet_notifier(&fx), ConflictPolicy::Skip)
        .generate(date(2024, 1, 1), date(2024, 1, 14))
        .await
        .unwrap();
    (fx, template.id)
}

#[tokio::test]
async fn test_regenerate_future_only_leaves_occurrences() {
    let (fx, template_id) = generated_fixture().await;

    fx.template_manager(TemplateEditPolicy::RegenerateFutureOnly)
        .update(
            template_id,
            UpdateTemplateRequest {
                weekday: 1,
                start_time: time(14, 0),
                end_time: time(15, 30),
            },
        )
        .await
        .unwrap();

    let stored = fx.store.occurrences().await;
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|o| o.end_time == time(15, 0)));
}

#[tokio::test]
async fn test_update_existing_resizes_future_occurrences() {
    let (fx, template_id) = generated_fixture().await;

    let updated = fx
        .template_manager(TemplateEditPolicy::UpdateExisting)
        .update(
            template_id,
            UpdateTemplateRequest {
                weekday: 1,
                start_time: time(14, 0),
                end_time: time(15, 30),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.end_time, time(15, 30));
    let ends: Vec<_> = fx
        .store
        .occurrences()
        .await
        .iter()
        .map(|o| (o.date, o.end_time))
        .collect();
    assert_eq!(
        ends,
        vec![
            (date(2023, 12, 25), time(15, 0)),
            (date(2024, 1, 1), time(15, 30)),
            (date(2024, 1, 8), time(15, 30)),
        ]
    );
}

#[tokio::test]
async fn test_update_existing_hides_future_occurrences_when_weekday_changes() {
    let (fx, template_id) = generated_fixture().await;

    fx.template_manager(TemplateEditPolicy::UpdateExisting)
        .update(
            template_id,
            UpdateTemplateRequest {
                weekday: 3,
                start_time: time(14, 0),
                end_time: time(15, 0),
            },
        )
        .await
        .unwrap();
    let report = fx
        .generator(quiet_notifier(&fx), ConflictPolicy::Skip)
        .generate(date(2024, 1, 1), date(2024, 1, 14))
        .await
        .unwrap();

    assert_eq!(report.created, 2);
    let states: Vec<_> = fx
        .store
        .occurrences()
        .await
        .iter()
        .map(|o| (o.date, o.state()))
        .collect();
    assert_eq!(
        states,
        vec![
            (date(2023, 12, 25), OccurrenceState::Unassigned),
            (date(2024, 1, 1), OccurrenceState::Hidden),
            (date(2024, 1, 3), OccurrenceState::Unassigned),
            (date(2024, 1, 8), OccurrenceState::Hidden),
            (date(2024, 1, 10), OccurrenceState::Unassigned),
        ]
    );
}

#[tokio::test]
async fn test_remove_hides_upcoming_sessions_and_stops_generation() {
    let (fx, template_id) = generated_fixture().await;
    let manager = fx.template_manager(TemplateEditPolicy::RegenerateFutureOnly);

    let hidden = manager.remove(template_id).await.unwrap();
    let report = fx
        .generator(quiet_notifier(&fx), ConflictPolicy::Skip)
        .generate(date(2024, 1, 1), date(2024, 1, 28))
        .await
        .unwrap();
    let again = manager.remove(template_id).await;

    assert_eq!(hidden, 2);
    assert_eq!(report.created, 0);
    assert!(matches!(again, Err(ScheduleError::NotFound(_))));
    let template = fx.store.get_template(template_id).await.unwrap().unwrap();
    assert!(!template.is_active);
}

#[tokio::test]
async fn test_recreated_template_materializes_hidden_dates_again() {
    let fx = Fixture::new().await;
    let manager = fx.template_manager(TemplateEditPolicy::RegenerateFutureOnly);
    let generator = fx.generator(quiet_notifier(&fx), ConflictPolicy::Skip);
    let first = manager
        .create(create_request(fx.relationship.id, 1, (14, 0), (15, 0)))
        .await
        .unwrap();
    let initial = generator.generate(date(2024, 1, 1), date(2024, 1, 14)).await.unwrap();

    manager.remove(first.id).await.unwrap();
    manager
        .create(create_request(fx.relationship.id, 1, (14, 0), (15, 0)))
        .await
        .unwrap();
    let recreated = generator.generate(date(2024, 1, 1), date(2024, 1, 14)).await.unwrap();

    assert_eq!(initial.created, 2);
    assert_eq!(recreated.created, 2);
    assert_eq!(recreated.skipped_existing, 0);
    let visible: Vec<_> = fx
        .store
        .occurrences()
        .await
        .into_iter()
        .filter(|o| !o.is_hidden)
        .map(|o| o.date)
        .collect();
    assert_eq!(visible, vec![date(2024, 1, 1), date(2024, 1, 8)]);
}

#[tokio::test]
async fn test_weekday_moved_away_and_back_regenerates_sessions() {
    let (fx, template_id) = generated_fixture().await;
    let manager = fx.template_manager(TemplateEditPolicy::UpdateExisting);
    let generator = fx.generator(quiet_notifier(&fx), ConflictPolicy::Skip);
    let slot = |weekday| UpdateTemplateRequest {
        weekday,
        start_time: time(14, 0),
        end_time: time(15, 0),
    };

    manager.update(template_id, slot(2)).await.unwrap();
    let tuesdays = generator.generate(date(2024, 1, 1), date(2024, 1, 14)).await.unwrap();
    manager.update(template_id, slot(1)).await.unwrap();
    let mondays = generator.generate(date(2024, 1, 1), date(2024, 1, 14)).await.unwrap();

    assert_eq!(tuesdays.created, 2);
    assert_eq!(mondays.created, 2);
    let visible: Vec<_> = fx
        .store
        .occurrences()
        .await
        .into_iter()
        .filter(|o| !o.is_hidden && o.date >= date(2024, 1, 1))
        .map(|o| o.date)
        .collect();
    assert_eq!(visible, vec![date(2024, 1, 1), date(2024, 1, 8)]);
}

#[tokio::test]
async fn test_update_unknown_template_is_not_found() {
    let fx = Fixture::new().await;

    let result = fx
        .template_manager(TemplateEditPolicy::RegenerateFutureOnly)
        .update(
            Uuid::new_v4(),
            UpdateTemplateRequest {
                weekday: 1,
                start_time: time(14, 0),
                end_time: time(15, 0),
            },
        )
        .await;

    assert!(matches!(result, Err(ScheduleError::NotFound(_))));
}
