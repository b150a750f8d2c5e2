use super::*;
use crate::scene::model::MotionDirective;

fn three() -> SceneList {
    SceneList::new(vec![
        Scene::new("a", "one", MotionDirective::ZoomIn),
        Scene::new("b", "two", MotionDirective::ZoomOut),
        Scene::new("c", "three", MotionDirective::PanLeft),
    ])
}

#[test]
fn clamp_index_stays_in_bounds() {
    let list = three();
    assert_eq!(list.clamp_index(0), 0);
    assert_eq!(list.clamp_index(2), 2);
    assert_eq!(list.clamp_index(99), 2);
    assert_eq!(SceneList::default().clamp_index(5), 0);
}

#[test]
fn handles_share_edits_and_bump_version() {
    let producer = three();
    let reader = producer.clone();
    let v0 = reader.version();
    producer
        .set_narration(1, NarrationAudio::s16le_mono(vec![0, 0, 0, 0]))
        .unwrap();
    assert!(reader.version() > v0);
    assert!(reader.narration(1).is_some());
    assert!(reader.narration(0).is_none());
}

#[test]
fn reorder_changes_what_an_index_refers_to() {
    let list = three();
    list.reorder(2, 0).unwrap();
    let ids: Vec<_> = list.snapshot().into_iter().map(|s| s.id.0).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
    assert!(list.reorder(0, 3).is_err());
}

#[test]
fn update_out_of_bounds_is_validation_error() {
    let list = three();
    let err = list.update(7, |_| {}).unwrap_err();
    assert!(err.to_string().contains("out of bounds"));
}
