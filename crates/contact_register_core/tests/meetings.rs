use chrono::{DateTime, Duration, TimeZone, Utc};
use contact_register_core::{Contact, ContactManager, ErrorKind, Meeting, MeetingKind, StoreConfig};
use std::collections::BTreeSet;
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
}

struct Fixture {
    _dir: TempDir,
    manager: ContactManager,
    alice: Contact,
    bob: Contact,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::in_dir(dir.path()).with_reference_date(now());
    let mut manager = ContactManager::open(&config).unwrap();
    let alice_id = manager.add_new_contact("Alice", "intro").unwrap();
    let bob_id = manager.add_new_contact("Bob", "intro2").unwrap();
    let mut found = manager
        .get_contacts_by_ids(&[alice_id, bob_id])
        .unwrap()
        .into_iter();
    let alice = found.next().unwrap();
    let bob = found.next().unwrap();
    Fixture {
        _dir: dir,
        manager,
        alice,
        bob,
    }
}

fn set_of(contacts: &[&Contact]) -> BTreeSet<Contact> {
    contacts.iter().map(|contact| (*contact).clone()).collect()
}

fn ids(meetings: &[Meeting]) -> Vec<u32> {
    meetings.iter().map(Meeting::id).collect()
}

#[test]
fn future_meeting_is_served_by_future_accessor_only() {
    let mut fx = fixture();
    let both = set_of(&[&fx.alice, &fx.bob]);
    let tomorrow = now() + Duration::days(1);

    let id = fx.manager.add_future_meeting(&both, tomorrow).unwrap();
    assert_eq!(id, 1);

    let meeting = fx.manager.get_future_meeting(id).unwrap().unwrap();
    assert_eq!(meeting.date(), tomorrow);
    assert_eq!(meeting.contacts(), &both);
    assert_eq!(meeting.kind(), &MeetingKind::Future);

    let err = fx.manager.get_past_meeting(id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn past_meeting_is_served_by_past_accessor_only() {
    let mut fx = fixture();
    let yesterday = now() - Duration::days(1);
    fx.manager
        .add_new_past_meeting(&set_of(&[&fx.alice]), yesterday, "kickoff")
        .unwrap();

    let meeting = fx.manager.get_past_meeting(1).unwrap().unwrap();
    assert_eq!(meeting.notes(), Some("kickoff"));

    let err = fx.manager.get_future_meeting(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn unknown_meeting_ids_yield_none_from_every_accessor() {
    let fx = fixture();

    assert!(fx.manager.get_past_meeting(7).unwrap().is_none());
    assert!(fx.manager.get_future_meeting(7).unwrap().is_none());
    assert!(fx.manager.get_meeting(7).is_none());
}

#[test]
fn get_meeting_skips_date_validation() {
    let mut fx = fixture();
    let future_id = fx
        .manager
        .add_future_meeting(&set_of(&[&fx.bob]), now() + Duration::hours(2))
        .unwrap();
    fx.manager
        .add_new_past_meeting(&set_of(&[&fx.bob]), now() - Duration::hours(2), "")
        .unwrap();

    assert_eq!(fx.manager.get_meeting(future_id).unwrap().id(), future_id);
    assert_eq!(fx.manager.get_meeting(2).unwrap().notes(), Some(""));
    assert!(fx.manager.is_known_meeting_id(2));
}

#[test]
fn add_future_meeting_checks_absent_arguments_first() {
    let mut fx = fixture();
    let both = set_of(&[&fx.alice, &fx.bob]);

    let err = fx
        .manager
        .add_future_meeting(None::<&BTreeSet<Contact>>, now() - Duration::days(3))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullReference);

    let err = fx
        .manager
        .add_future_meeting(&both, None::<DateTime<Utc>>)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullReference);
}

#[test]
fn add_future_meeting_rejects_non_future_dates_without_consuming_an_id() {
    let mut fx = fixture();
    let both = set_of(&[&fx.alice, &fx.bob]);

    let err = fx
        .manager
        .add_future_meeting(&both, now() - Duration::minutes(1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = fx.manager.add_future_meeting(&both, now()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    assert_eq!(fx.manager.meeting_id_counter(), 0);
    assert!(fx.manager.meetings().is_empty());
    assert_eq!(
        fx.manager
            .add_future_meeting(&both, now() + Duration::minutes(1))
            .unwrap(),
        1
    );
}

#[test]
fn add_future_meeting_rejects_unknown_or_forged_contacts() {
    let mut fx = fixture();
    let stranger = Contact::new(99, "Mallory", "unknown");
    let forged = Contact::new(fx.alice.id(), "Not Alice", "intro");
    let tomorrow = now() + Duration::days(1);

    let err = fx
        .manager
        .add_future_meeting(&set_of(&[&fx.alice, &stranger]), tomorrow)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = fx
        .manager
        .add_future_meeting(&set_of(&[&forged]), tomorrow)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(fx.manager.meetings().is_empty());
}

#[test]
fn empty_contact_set_is_accepted_for_future_but_not_past_meetings() {
    let mut fx = fixture();
    let empty = BTreeSet::new();

    let id = fx
        .manager
        .add_future_meeting(&empty, now() + Duration::days(1))
        .unwrap();
    assert!(fx.manager.get_meeting(id).unwrap().contacts().is_empty());

    let err = fx
        .manager
        .add_new_past_meeting(&empty, now() - Duration::days(1), "notes")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn add_new_past_meeting_validates_in_documented_order() {
    let mut fx = fixture();
    let alice_only = set_of(&[&fx.alice]);
    let stranger = set_of(&[&Contact::new(50, "Mallory", "x")]);
    let yesterday = now() - Duration::days(1);

    let err = fx
        .manager
        .add_new_past_meeting(&alice_only, yesterday, None::<&str>)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullReference);

    let err = fx
        .manager
        .add_new_past_meeting(&BTreeSet::new(), now() + Duration::days(1), "x")
        .unwrap_err();
    assert!(err.to_string().contains("after the reference date"));

    let err = fx
        .manager
        .add_new_past_meeting(&stranger, yesterday, "x")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(fx.manager.meeting_id_counter(), 0);
}

#[test]
fn past_meeting_may_be_dated_exactly_at_the_reference_date() {
    let mut fx = fixture();
    fx.manager
        .add_new_past_meeting(&set_of(&[&fx.alice]), now(), "standup")
        .unwrap();

    let listed = fx.manager.get_past_meeting_list_for(&fx.alice).unwrap();
    assert_eq!(ids(&listed), vec![1]);
    let err = fx.manager.get_past_meeting(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn meeting_ids_strictly_increase_across_both_variants() {
    let mut fx = fixture();
    let alice_only = set_of(&[&fx.alice]);

    let first = fx
        .manager
        .add_future_meeting(&alice_only, now() + Duration::days(1))
        .unwrap();
    fx.manager
        .add_new_past_meeting(&alice_only, now() - Duration::days(1), "")
        .unwrap();
    let third = fx
        .manager
        .add_future_meeting(&alice_only, now() + Duration::days(2))
        .unwrap();

    assert_eq!((first, third), (1, 3));
    assert_eq!(ids(fx.manager.meetings()), vec![1, 2, 3]);
}

#[test]
fn future_list_is_sorted_and_restricted_to_the_contact() {
    let mut fx = fixture();
    let alice_only = set_of(&[&fx.alice]);
    let bob_only = set_of(&[&fx.bob]);
    let both = set_of(&[&fx.alice, &fx.bob]);

    fx.manager
        .add_future_meeting(&alice_only, now() + Duration::days(10))
        .unwrap();
    fx.manager
        .add_future_meeting(&bob_only, now() + Duration::days(1))
        .unwrap();
    fx.manager
        .add_future_meeting(&both, now() + Duration::days(3))
        .unwrap();
    fx.manager
        .add_new_past_meeting(&alice_only, now() - Duration::days(2), "")
        .unwrap();

    let alice_meetings = fx.manager.get_future_meeting_list(&fx.alice).unwrap();
    assert_eq!(ids(&alice_meetings), vec![3, 1]);
    let bob_meetings = fx.manager.get_future_meeting_list(&fx.bob).unwrap();
    assert_eq!(ids(&bob_meetings), vec![2, 3]);
}

#[test]
fn past_list_is_sorted_and_restricted_to_the_contact() {
    let mut fx = fixture();
    let alice_only = set_of(&[&fx.alice]);
    let both = set_of(&[&fx.alice, &fx.bob]);

    fx.manager
        .add_new_past_meeting(&both, now() - Duration::days(1), "recent")
        .unwrap();
    fx.manager
        .add_new_past_meeting(&alice_only, now() - Duration::days(30), "old")
        .unwrap();
    fx.manager
        .add_future_meeting(&both, now() + Duration::days(1))
        .unwrap();

    let alice_meetings = fx.manager.get_past_meeting_list_for(&fx.alice).unwrap();
    assert_eq!(ids(&alice_meetings), vec![2, 1]);
    let bob_meetings = fx.manager.get_past_meeting_list_for(&fx.bob).unwrap();
    assert_eq!(ids(&bob_meetings), vec![1]);
}

#[test]
fn contact_lists_reject_absent_or_unknown_contacts() {
    let fx = fixture();
    let stranger = Contact::new(77, "Mallory", "x");

    let err = fx
        .manager
        .get_future_meeting_list(None::<&Contact>)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullReference);
    let err = fx.manager.get_future_meeting_list(&stranger).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = fx
        .manager
        .get_past_meeting_list_for(None::<&Contact>)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullReference);
    let err = fx.manager.get_past_meeting_list_for(&stranger).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn meeting_list_on_matches_exact_date_only() {
    let mut fx = fixture();
    let both = set_of(&[&fx.alice, &fx.bob]);
    let target = now() + Duration::days(4);

    fx.manager.add_future_meeting(&both, target).unwrap();
    fx.manager
        .add_future_meeting(&both, target + Duration::seconds(1))
        .unwrap();
    fx.manager
        .add_future_meeting(&set_of(&[&fx.bob]), target)
        .unwrap();

    let listed = fx.manager.get_meeting_list_on(target).unwrap();
    assert_eq!(ids(&listed), vec![1, 3]);
    assert!(fx
        .manager
        .get_meeting_list_on(now() + Duration::days(40))
        .unwrap()
        .is_empty());

    let err = fx
        .manager
        .get_meeting_list_on(None::<DateTime<Utc>>)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullReference);
}

#[test]
fn meeting_list_on_includes_past_and_future_records() {
    let mut fx = fixture();
    let alice_only = set_of(&[&fx.alice]);
    let past_day = now() - Duration::days(2);

    fx.manager
        .add_new_past_meeting(&alice_only, past_day, "review")
        .unwrap();
    fx.manager
        .add_new_past_meeting(&alice_only, past_day, "retro")
        .unwrap();

    let listed = fx.manager.get_meeting_list_on(past_day).unwrap();
    assert_eq!(ids(&listed), vec![1, 2]);
}
