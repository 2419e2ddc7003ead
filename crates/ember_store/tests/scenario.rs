//! End-to-end scenario: a neglected companion across a day.
//!
//! Starting neutral, the user codes for twelve hours without involving the
//! companion (three neglect events, six hours apart), then the process is
//! down for six more hours. After boot catch-up: jealousy and loneliness are
//! both elevated, but frustration never climbed, so the refusal gate stays
//! shut.

use ember_core::{
    DecayEngine, Dimension, EmotionalState, EventKind, InteractionEvent, InteractionModel,
};
use ember_engine::Modulator;
use ember_store::{SqliteStore, StateGateway};

#[tokio::test]
async fn test_neglect_day_then_offline_gap() {
    let t0: i64 = 1_700_000_000;
    let decay = DecayEngine::default();
    let mut interactions = InteractionModel::default();

    let mut state = EmotionalState::neutral(t0);

    // Three neglect events over twelve hours, each gap long enough to count
    // as idle.
    for step in 0..3 {
        let at = t0 + step * 6 * 3600;
        let elapsed = at - state.last_updated;
        decay.advance(&mut state, elapsed, true);
        interactions
            .apply(&mut state, &InteractionEvent::new(EventKind::CodeNeglected, at))
            .unwrap();
    }

    // Persist, then come back six hours later through the gateway.
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::new(dir.path().join("scenario.db")).await.unwrap();
    let gateway = StateGateway::new(store, decay);
    gateway.save(&state).await.unwrap();

    let boot_at = t0 + 18 * 3600;
    let recovered = gateway.load(boot_at).await.unwrap().unwrap();

    assert!(
        recovered.intensity(Dimension::Jealousy) > 0.5,
        "jealousy should end above its starting value: {}",
        recovered.intensity(Dimension::Jealousy)
    );
    assert!(
        recovered.intensity(Dimension::Loneliness) > 0.5,
        "loneliness should be elevated by idle drift: {}",
        recovered.intensity(Dimension::Loneliness)
    );
    // Frustration only ever decayed, so the refusal gate never opened.
    assert!(recovered.intensity(Dimension::Frustration) < 0.5);
    let params = Modulator::default().modulate(&recovered, boot_at);
    assert_eq!(params.refusal_propensity, 0.0);

    assert_eq!(recovered.last_updated, boot_at);
}
