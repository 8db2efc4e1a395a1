use super::*;

const LIMIT: usize = 5;
const WINDOW: Duration = Duration::from_secs(60);

#[test]
fn allows_up_to_limit() {
    let rl = RateLimiter::new();
    let now = Instant::now();

    for i in 0..LIMIT {
        let decision = rl
            .check_and_consume_at("user-1", LIMIT, WINDOW, now)
            .unwrap_or_else(|_| panic!("request {i} should succeed"));
        assert_eq!(decision.remaining, LIMIT - i - 1);
    }
    assert!(matches!(
        rl.check_and_consume_at("user-1", LIMIT, WINDOW, now),
        Err(RateLimitError::Exceeded { limit: LIMIT, .. })
    ));
}

#[test]
fn rejected_requests_are_not_recorded() {
    let rl = RateLimiter::new();
    let start = Instant::now();

    for _ in 0..LIMIT {
        rl.check_and_consume_at("user-1", LIMIT, WINDOW, start).unwrap();
    }
    // Hammer while full; none of these should extend the window.
    for _ in 0..10 {
        assert!(rl.check_and_consume_at("user-1", LIMIT, WINDOW, start).is_err());
    }

    // Once the accepted requests age out, capacity returns in full.
    let after = start + WINDOW;
    let decision = rl.check_and_consume_at("user-1", LIMIT, WINDOW, after).unwrap();
    assert_eq!(decision.remaining, LIMIT - 1);
}

#[test]
fn entry_expires_exactly_at_the_window_boundary() {
    let rl = RateLimiter::new();
    let start = Instant::now();

    for _ in 0..LIMIT {
        rl.check_and_consume_at("user-1", LIMIT, WINDOW, start).unwrap();
    }
    assert!(rl.check_and_consume_at("user-1", LIMIT, WINDOW, start).is_err());

    // One instant short of the boundary the entries still count...
    let just_before = start + WINDOW - Duration::from_millis(1);
    assert!(rl.check_and_consume_at("user-1", LIMIT, WINDOW, just_before).is_err());

    // ...and at exactly start + window they have aged out.
    let boundary = start + WINDOW;
    assert!(rl.check_and_consume_at("user-1", LIMIT, WINDOW, boundary).is_ok());
}

#[test]
fn distinct_identities_do_not_interfere() {
    let rl = RateLimiter::new();
    let now = Instant::now();

    for _ in 0..LIMIT {
        rl.check_and_consume_at("user-a", LIMIT, WINDOW, now).unwrap();
    }
    assert!(rl.check_and_consume_at("user-a", LIMIT, WINDOW, now).is_err());
    assert!(rl.check_and_consume_at("user-b", LIMIT, WINDOW, now).is_ok());
}

#[test]
fn different_ceilings_share_one_window_per_identity() {
    // The caller picks the ceiling; the recorded window is per identity.
    let rl = RateLimiter::new();
    let now = Instant::now();

    rl.check_and_consume_at("ip-1", 2, WINDOW, now).unwrap();
    rl.check_and_consume_at("ip-1", 2, WINDOW, now).unwrap();
    assert!(rl.check_and_consume_at("ip-1", 2, WINDOW, now).is_err());
    // A higher ceiling still sees the two recorded requests.
    let decision = rl.check_and_consume_at("ip-1", 4, WINDOW, now).unwrap();
    assert_eq!(decision.remaining, 1);
}

#[test]
fn retry_after_counts_down_to_oldest_expiry() {
    let rl = RateLimiter::new();
    let start = Instant::now();

    for _ in 0..LIMIT {
        rl.check_and_consume_at("user-1", LIMIT, WINDOW, start).unwrap();
    }

    let later = start + Duration::from_secs(20);
    let Err(RateLimitError::Exceeded { retry_after_secs, .. }) =
        rl.check_and_consume_at("user-1", LIMIT, WINDOW, later)
    else {
        panic!("expected rejection");
    };
    assert_eq!(retry_after_secs, 40);
}

#[test]
fn sliding_window_frees_capacity_gradually() {
    let rl = RateLimiter::new();
    let start = Instant::now();

    rl.check_and_consume_at("user-1", 2, WINDOW, start).unwrap();
    rl.check_and_consume_at("user-1", 2, WINDOW, start + Duration::from_secs(30))
        .unwrap();

    // First entry has aged out at start+61s; second has not.
    let t = start + Duration::from_secs(61);
    rl.check_and_consume_at("user-1", 2, WINDOW, t).unwrap();
    assert!(rl.check_and_consume_at("user-1", 2, WINDOW, t).is_err());
}

#[test]
fn ceilings_are_ordered() {
    let (anon_limit, anon_window) = anonymous_ceiling();
    let (auth_limit, auth_window) = authenticated_ceiling();
    assert!(anon_limit < auth_limit);
    assert_eq!(anon_window, auth_window);
}
