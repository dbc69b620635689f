//! Tests for the contact limiter.

use kickoff_rs::executioner::ContactLimiter;
use kickoff_rs::model::ContactId;

#[test]
fn batch_limit_is_clamped_to_at_least_one() {
    assert_eq!(ContactLimiter::new(0).batch_limit(), 1);
    assert_eq!(ContactLimiter::new(500).batch_limit(), 500);
}

#[test]
fn cursor_starts_unset_and_advances() {
    let mut limiter = ContactLimiter::new(100);
    assert_eq!(limiter.batch_min_contact_id(), None);

    limiter.set_batch_min_contact_id(ContactId(42));
    assert_eq!(limiter.batch_min_contact_id(), Some(ContactId(42)));

    limiter.set_batch_min_contact_id(ContactId(99));
    assert_eq!(limiter.batch_min_contact_id(), Some(ContactId(99)));
}

#[test]
fn single_contact_mode_is_opt_in() {
    let limiter = ContactLimiter::new(100);
    assert_eq!(limiter.contact_id(), None);

    let limiter = ContactLimiter::new(100).for_contact(ContactId(7));
    assert_eq!(limiter.contact_id(), Some(ContactId(7)));
}

#[test]
fn contact_id_next_is_the_strict_successor() {
    assert_eq!(ContactId(12).next(), ContactId(13));
}
