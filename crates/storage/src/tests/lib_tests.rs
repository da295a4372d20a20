use super::*;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let prefs = Preferences::new("sqlite::memory:").await.expect("db");
    prefs.health_check().await.expect("health check");
}

#[tokio::test]
async fn round_trips_every_recognized_key() {
    let prefs = Preferences::new("sqlite::memory:").await.expect("db");

    for (key, value) in [
        (KEY_TOUR_ACTIVE, "true"),
        (KEY_TOUR_ACTIVE, "false"),
        (KEY_MUSIC_MODE, "none"),
        (KEY_MUSIC_MODE, "default"),
        (KEY_MUSIC_MODE, "custom"),
        (KEY_IS_PLAYING, "true"),
        (KEY_IS_PLAYING, "false"),
    ] {
        prefs.set(key, value).await.expect("set");
        assert_eq!(prefs.get(key).await.expect("get").as_deref(), Some(value));
    }
}

#[tokio::test]
async fn absent_keys_read_as_inactive_defaults() {
    let prefs = Preferences::new("sqlite::memory:").await.expect("db");

    assert!(!prefs.tour_active().await.expect("tour active"));
    assert!(!prefs.is_playing().await.expect("is playing"));
    assert_eq!(
        prefs.music_mode().await.expect("music mode"),
        MusicModeTag::None
    );
    assert_eq!(prefs.get("unknownKey").await.expect("get"), None);
}

#[tokio::test]
async fn last_write_wins_and_rewrites_are_harmless() {
    let prefs = Preferences::new("sqlite::memory:").await.expect("db");

    prefs.set_music_mode(MusicModeTag::Default).await.expect("set");
    prefs.set_music_mode(MusicModeTag::Default).await.expect("set again");
    prefs.set_music_mode(MusicModeTag::Custom).await.expect("overwrite");

    assert_eq!(
        prefs.music_mode().await.expect("music mode"),
        MusicModeTag::Custom
    );
}

#[tokio::test]
async fn unrecognized_music_mode_value_falls_back_to_none() {
    let prefs = Preferences::new("sqlite::memory:").await.expect("db");

    prefs.set(KEY_MUSIC_MODE, "vaporwave").await.expect("set");
    assert_eq!(
        prefs.music_mode().await.expect("music mode"),
        MusicModeTag::None
    );
}

#[tokio::test]
async fn typed_boolean_accessors_round_trip() {
    let prefs = Preferences::new("sqlite::memory:").await.expect("db");

    prefs.set_tour_active(true).await.expect("set");
    assert!(prefs.tour_active().await.expect("get"));
    prefs.set_tour_active(false).await.expect("set");
    assert!(!prefs.tour_active().await.expect("get"));

    prefs.set_is_playing(true).await.expect("set");
    assert!(prefs.is_playing().await.expect("get"));
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("memory_lane_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("preferences.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let prefs = Preferences::new(&database_url).await.expect("db");
    prefs.set_tour_active(true).await.expect("set");
    drop(prefs);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    let reopened = Preferences::new(&database_url).await.expect("reopen");
    assert!(reopened.tour_active().await.expect("survives reopen"));
    drop(reopened);

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}
