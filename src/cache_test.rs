use super::*;
use crate::generator::types::{FontPairing, PaletteColor};

fn payload() -> DesignPayload {
    DesignPayload {
        colors: vec![PaletteColor {
            name: "Ink".into(),
            hex: "#1A1A2E".into(),
            role: Some("primary".into()),
        }],
        font_pairings: vec![FontPairing { heading: "Inter".into(), body: "Source Serif".into() }],
        summary: None,
    }
}

// =============================================================================
// KEY DERIVATION
// =============================================================================

#[test]
fn key_is_case_and_whitespace_insensitive() {
    assert_eq!(
        cache_key("Modern Tech Startup", Some("tech"), None),
        cache_key("  modern tech startup  ", Some("tech"), None)
    );
}

#[test]
fn key_differs_by_industry() {
    assert_ne!(
        cache_key("Modern Tech Startup", Some("tech"), None),
        cache_key("Modern Tech Startup", Some("finance"), None)
    );
}

#[test]
fn key_differs_by_audience() {
    assert_ne!(
        cache_key("Modern Tech Startup", None, Some("developers")),
        cache_key("Modern Tech Startup", None, Some("designers"))
    );
}

#[test]
fn absent_field_differs_from_empty_field() {
    assert_ne!(
        cache_key("Modern Tech Startup", None, None),
        cache_key("Modern Tech Startup", Some(""), None)
    );
}

#[test]
fn key_is_hex_sha256() {
    let key = cache_key("brand", None, None);
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn brief_key_matches_field_key() {
    let brief = DesignBrief {
        brand_description: "Modern Tech Startup".into(),
        industry: Some("tech".into()),
        audience: None,
    };
    assert_eq!(brief_key(&brief), cache_key("Modern Tech Startup", Some("tech"), None));
}

// =============================================================================
// TTL BEHAVIOR
// =============================================================================

#[test]
fn get_returns_stored_entry() {
    let cache = DesignCache::with_ttl(Duration::from_secs(60));
    let now = Instant::now();
    cache.put_at("k".into(), payload(), Tier::Basic, now);

    let hit = cache.get_at("k", now + Duration::from_secs(59)).unwrap();
    assert_eq!(hit.tier, Tier::Basic);
    assert_eq!(hit.payload.colors.len(), 1);
}

#[test]
fn expired_entry_is_absent() {
    let cache = DesignCache::with_ttl(Duration::from_secs(60));
    let now = Instant::now();
    cache.put_at("k".into(), payload(), Tier::Basic, now);

    assert!(cache.get_at("k", now + Duration::from_secs(60)).is_none());
    // The expired slot was dropped on access, not just hidden.
    assert!(cache.get_at("k", now).is_none());
}

#[test]
fn missing_key_is_a_miss() {
    let cache = DesignCache::with_ttl(Duration::from_secs(60));
    assert!(cache.get("nope").is_none());
}

#[test]
fn put_replaces_previous_entry() {
    let cache = DesignCache::with_ttl(Duration::from_secs(60));
    let now = Instant::now();
    cache.put_at("k".into(), payload(), Tier::Basic, now);
    cache.put_at("k".into(), payload(), Tier::Enterprise, now);

    assert_eq!(cache.get_at("k", now).unwrap().tier, Tier::Enterprise);
}
