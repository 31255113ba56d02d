//! Integration tests for `SqliteStore` against an in-memory database.

use rescue_core::{
  account::{
    AccountKind, Credential, InformantProfile, NewAccount, OrganizationProfile,
    Profile, RescuerProfile,
  },
  animal::{AnimalAttributes, Gender, NewAnimal},
  report::NewReport,
  store::{AnimalQuery, RescueStore},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn core(err: Error) -> rescue_core::Error { err.into() }

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn informant(username: &str) -> NewAccount {
  NewAccount {
    email:         format!("{username}@example.org"),
    phone_number:  format!("555-{username}"),
    password_hash: "hash".into(),
    profile:       Profile::Informant(InformantProfile {
      full_name: "Ada Informant".into(),
      username:  username.into(),
      avatar:    "/media/ada.png".into(),
    }),
  }
}

fn organization(name: &str) -> NewAccount {
  NewAccount {
    email:         format!("{name}@shelter.org"),
    phone_number:  format!("555-{name}"),
    password_hash: "hash".into(),
    profile:       Profile::Organization(OrganizationProfile {
      org_name: name.into(),
      location: "Pune".into(),
      logo:     "/media/logo.png".into(),
    }),
  }
}

fn rescuer(name: &str, org_id: Uuid) -> NewAccount {
  NewAccount {
    email:         format!("{name}@rescue.org"),
    phone_number:  format!("555-{name}"),
    password_hash: "hash".into(),
    profile:       Profile::Rescuer(RescuerProfile {
      rescuer_name: name.into(),
      avatar:       "/media/rescuer.png".into(),
      org_id,
    }),
  }
}

fn stray(informant_id: Uuid, animal_type: &str) -> NewAnimal {
  NewAnimal {
    informant_id,
    attributes: AnimalAttributes {
      animal_type:   animal_type.into(),
      breed:         Some("indie".into()),
      age:           Some(2),
      gender:        Gender::Female,
      health_status: "limping".into(),
      location:      "MG Road".into(),
    },
    animal_picture: "/media/stray.png".into(),
  }
}

fn page(rescue_status: Option<bool>, page: u32, size: u32) -> AnimalQuery {
  AnimalQuery::new(rescue_status, Some(page), Some(size)).unwrap()
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_account() {
  let s = store().await;
  let created = s.create_account(informant("ada")).await.unwrap();
  assert_eq!(created.kind(), AccountKind::Informant);
  assert!(created.refresh_token.is_none());

  let fetched = s
    .get_account(AccountKind::Informant, created.account_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(fetched.email, "ada@example.org");
  assert_eq!(fetched.profile, created.profile);
}

#[tokio::test]
async fn get_account_is_scoped_to_kind() {
  let s = store().await;
  let created = s.create_account(informant("ada")).await.unwrap();
  let other = s
    .get_account(AccountKind::Organization, created.account_id)
    .await
    .unwrap();
  assert!(other.is_none());
}

#[tokio::test]
async fn duplicate_email_names_the_field() {
  let s = store().await;
  s.create_account(informant("ada")).await.unwrap();

  let mut again = informant("bob");
  again.email = "ada@example.org".into();
  let err = core(s.create_account(again).await.unwrap_err());
  assert!(matches!(err, rescue_core::Error::Duplicate(ref f) if f == "email"));
}

#[tokio::test]
async fn duplicate_username_and_phone_are_detected() {
  let s = store().await;
  s.create_account(informant("ada")).await.unwrap();

  let mut same_handle = informant("ada");
  same_handle.email = "other@example.org".into();
  same_handle.phone_number = "555-other".into();
  let err = core(s.create_account(same_handle).await.unwrap_err());
  assert!(matches!(err, rescue_core::Error::Duplicate(ref f) if f == "username"));

  let mut same_phone = informant("bob");
  same_phone.phone_number = "555-ada".into();
  let err = core(s.create_account(same_phone).await.unwrap_err());
  assert!(matches!(err, rescue_core::Error::Duplicate(ref f) if f == "phoneNumber"));
}

#[tokio::test]
async fn same_email_is_allowed_across_kinds() {
  let s = store().await;
  s.create_account(informant("ada")).await.unwrap();

  let mut org = organization("paws");
  org.email = "ada@example.org".into();
  s.create_account(org).await.unwrap();
}

#[tokio::test]
async fn find_account_by_email_and_username() {
  let s = store().await;
  let created = s.create_account(informant("ada")).await.unwrap();

  let by_email = s
    .find_account(AccountKind::Informant, &Credential::Email("ada@example.org".into()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_email.account_id, created.account_id);

  let by_name = s
    .find_account(AccountKind::Informant, &Credential::Username("ada".into()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_name.account_id, created.account_id);

  let wrong_kind = s
    .find_account(AccountKind::Rescuer, &Credential::Email("ada@example.org".into()))
    .await
    .unwrap();
  assert!(wrong_kind.is_none());
}

#[tokio::test]
async fn refresh_token_rotation_is_compare_and_swap() {
  let s = store().await;
  let acct = s.create_account(organization("paws")).await.unwrap();
  let (kind, id) = (AccountKind::Organization, acct.account_id);

  s.set_refresh_token(kind, id, Some("r1".into())).await.unwrap();

  assert!(s.rotate_refresh_token(kind, id, "r1".into(), "r2".into()).await.unwrap());
  // The old token no longer matches.
  assert!(!s.rotate_refresh_token(kind, id, "r1".into(), "r3".into()).await.unwrap());

  let stored = s.get_account(kind, id).await.unwrap().unwrap();
  assert_eq!(stored.refresh_token.as_deref(), Some("r2"));

  s.set_refresh_token(kind, id, None).await.unwrap();
  assert!(!s.rotate_refresh_token(kind, id, "r2".into(), "r4".into()).await.unwrap());
}

#[tokio::test]
async fn set_password_hash_updates_and_reports_missing() {
  let s = store().await;
  let acct = s.create_account(informant("ada")).await.unwrap();

  s.set_password_hash(AccountKind::Informant, acct.account_id, "new-hash".into())
    .await
    .unwrap();
  let stored = s
    .get_account(AccountKind::Informant, acct.account_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.password_hash, "new-hash");

  let err = core(
    s.set_password_hash(AccountKind::Informant, Uuid::new_v4(), "x".into())
      .await
      .unwrap_err(),
  );
  assert!(matches!(err, rescue_core::Error::NotFound { .. }));
}

#[tokio::test]
async fn replace_image_returns_previous_url() {
  let s = store().await;
  let org = s.create_account(organization("paws")).await.unwrap();

  let (updated, previous) = s
    .replace_image(AccountKind::Organization, org.account_id, "/media/new.png".into())
    .await
    .unwrap();
  assert_eq!(previous, "/media/logo.png");
  assert_eq!(updated.profile.image(), "/media/new.png");
  assert!(updated.updated_at >= org.updated_at);

  let err = core(
    s.replace_image(AccountKind::Informant, Uuid::new_v4(), "/media/x.png".into())
      .await
      .unwrap_err(),
  );
  assert!(matches!(err, rescue_core::Error::NotFound { .. }));
}

// ─── Rescuer roster ──────────────────────────────────────────────────────────

#[tokio::test]
async fn rescuers_are_listed_per_organization() {
  let s = store().await;
  let paws = s.create_account(organization("paws")).await.unwrap();
  let claws = s.create_account(organization("claws")).await.unwrap();

  s.create_account(rescuer("ravi", paws.account_id)).await.unwrap();
  s.create_account(rescuer("meera", paws.account_id)).await.unwrap();
  s.create_account(rescuer("tom", claws.account_id)).await.unwrap();

  let roster = s.list_rescuers(paws.account_id).await.unwrap();
  let names: Vec<_> = roster.iter().filter_map(|a| a.profile.handle()).collect();
  assert_eq!(names, vec!["ravi", "meera"]);
}

#[tokio::test]
async fn delete_rescuer_only_within_own_organization() {
  let s = store().await;
  let paws = s.create_account(organization("paws")).await.unwrap();
  let claws = s.create_account(organization("claws")).await.unwrap();
  let ravi = s.create_account(rescuer("ravi", paws.account_id)).await.unwrap();

  let foreign = s.delete_rescuer(claws.account_id, ravi.account_id).await.unwrap();
  assert!(foreign.is_none());

  let removed = s
    .delete_rescuer(paws.account_id, ravi.account_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(removed.account_id, ravi.account_id);
  assert!(s.list_rescuers(paws.account_id).await.unwrap().is_empty());

  let again = s.delete_rescuer(paws.account_id, ravi.account_id).await.unwrap();
  assert!(again.is_none());
}

// ─── Animal registry ─────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_animal() {
  let s = store().await;
  let ada = s.create_account(informant("ada")).await.unwrap();
  let created = s.create_animal(stray(ada.account_id, "dog")).await.unwrap();
  assert!(!created.rescue_status);

  let fetched = s.get_animal(created.animal_id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert!(s.get_animal(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_animals_paginates_newest_first() {
  let s = store().await;
  let ada = s.create_account(informant("ada")).await.unwrap();
  let mut ids = Vec::new();
  for _ in 0..15 {
    ids.push(s.create_animal(stray(ada.account_id, "dog")).await.unwrap().animal_id);
  }
  ids.reverse();

  let first = s.list_animals(page(None, 1, 10)).await.unwrap();
  assert_eq!(first.len(), 10);
  let first_ids: Vec<_> = first.iter().map(|a| a.animal_id).collect();
  assert_eq!(first_ids, ids[..10]);

  let second = s.list_animals(page(None, 2, 10)).await.unwrap();
  assert_eq!(second.len(), 5);
  assert_eq!(second[0].animal_id, ids[10]);

  let beyond = s.list_animals(page(None, 3, 10)).await.unwrap();
  assert!(beyond.is_empty());
}

#[tokio::test]
async fn list_animals_filters_by_status() {
  let s = store().await;
  let ada = s.create_account(informant("ada")).await.unwrap();
  let paws = s.create_account(organization("paws")).await.unwrap();
  let ravi = s.create_account(rescuer("ravi", paws.account_id)).await.unwrap();

  let dog = s.create_animal(stray(ada.account_id, "dog")).await.unwrap();
  s.create_animal(stray(ada.account_id, "cat")).await.unwrap();
  s.create_animal(stray(ada.account_id, "cow")).await.unwrap();
  s.assign_rescue(dog.animal_id, ravi.account_id, paws.account_id)
    .await
    .unwrap();

  let rescued = s.list_animals(page(Some(true), 1, 10)).await.unwrap();
  assert_eq!(rescued.len(), 1);
  assert_eq!(rescued[0].animal_id, dog.animal_id);

  let waiting = s.list_animals(page(Some(false), 1, 10)).await.unwrap();
  assert_eq!(waiting.len(), 2);
  assert!(waiting.iter().all(|a| !a.rescue_status));
}

#[tokio::test]
async fn list_animals_by_informant() {
  let s = store().await;
  let ada = s.create_account(informant("ada")).await.unwrap();
  let bob = s.create_account(informant("bob")).await.unwrap();

  s.create_animal(stray(ada.account_id, "dog")).await.unwrap();
  s.create_animal(stray(ada.account_id, "cat")).await.unwrap();
  s.create_animal(stray(bob.account_id, "cow")).await.unwrap();

  let mine = s.list_animals_by_informant(ada.account_id).await.unwrap();
  let types: Vec<_> = mine.iter().map(|a| a.animal_type.as_str()).collect();
  assert_eq!(types, vec!["dog", "cat"]);
}

// ─── Rescue ledger ───────────────────────────────────────────────────────────

#[tokio::test]
async fn assign_rescue_flips_status_once() {
  let s = store().await;
  let ada = s.create_account(informant("ada")).await.unwrap();
  let paws = s.create_account(organization("paws")).await.unwrap();
  let ravi = s.create_account(rescuer("ravi", paws.account_id)).await.unwrap();
  let meera = s.create_account(rescuer("meera", paws.account_id)).await.unwrap();
  let dog = s.create_animal(stray(ada.account_id, "dog")).await.unwrap();

  let assignment = s
    .assign_rescue(dog.animal_id, ravi.account_id, paws.account_id)
    .await
    .unwrap();
  assert_eq!(assignment.animal_id, dog.animal_id);
  assert!(s.get_animal(dog.animal_id).await.unwrap().unwrap().rescue_status);

  let err = core(
    s.assign_rescue(dog.animal_id, meera.account_id, paws.account_id)
      .await
      .unwrap_err(),
  );
  assert!(matches!(err, rescue_core::Error::AlreadyRescued(id) if id == dog.animal_id));

  // The losing attempt left no trace.
  assert_eq!(s.list_rescued_by_rescuer(meera.account_id).await.unwrap().total, 0);
  assert_eq!(s.list_rescued_by_org(paws.account_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn assign_rescue_unknown_animal_is_not_found() {
  let s = store().await;
  let err = core(
    s.assign_rescue(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4())
      .await
      .unwrap_err(),
  );
  assert!(matches!(err, rescue_core::Error::NotFound { .. }));
}

#[tokio::test]
async fn concurrent_assignments_produce_one_winner() {
  let s = store().await;
  let ada = s.create_account(informant("ada")).await.unwrap();
  let paws = s.create_account(organization("paws")).await.unwrap();
  let ravi = s.create_account(rescuer("ravi", paws.account_id)).await.unwrap();
  let meera = s.create_account(rescuer("meera", paws.account_id)).await.unwrap();
  let dog = s.create_animal(stray(ada.account_id, "dog")).await.unwrap();

  let (a, b) = (s.clone(), s.clone());
  let (first, second) = tokio::join!(
    a.assign_rescue(dog.animal_id, ravi.account_id, paws.account_id),
    b.assign_rescue(dog.animal_id, meera.account_id, paws.account_id),
  );

  let wins = [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count();
  assert_eq!(wins, 1);
  assert_eq!(s.list_rescued_by_org(paws.account_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn rescued_listings_are_scoped() {
  let s = store().await;
  let ada = s.create_account(informant("ada")).await.unwrap();
  let paws = s.create_account(organization("paws")).await.unwrap();
  let claws = s.create_account(organization("claws")).await.unwrap();
  let ravi = s.create_account(rescuer("ravi", paws.account_id)).await.unwrap();
  let tom = s.create_account(rescuer("tom", claws.account_id)).await.unwrap();

  let dog = s.create_animal(stray(ada.account_id, "dog")).await.unwrap();
  let cat = s.create_animal(stray(ada.account_id, "cat")).await.unwrap();
  let cow = s.create_animal(stray(ada.account_id, "cow")).await.unwrap();
  s.assign_rescue(dog.animal_id, ravi.account_id, paws.account_id).await.unwrap();
  s.assign_rescue(cat.animal_id, ravi.account_id, paws.account_id).await.unwrap();
  s.assign_rescue(cow.animal_id, tom.account_id, claws.account_id).await.unwrap();

  let tally = s.list_rescued_by_rescuer(ravi.account_id).await.unwrap();
  assert_eq!(tally.total, 2);
  assert!(tally.animals.iter().all(|a| a.rescue_status));

  let history = s.list_rescued_by_org(paws.account_id).await.unwrap();
  assert_eq!(history.len(), 2);
  assert!(history.iter().all(|r| r.animal_rescue_by_org.org_id == paws.account_id));
  assert!(history.iter().all(|r| r.animal_rescue_by_org.org_name == "paws"));
  // Newest first.
  assert_eq!(history[0].animal_details.animal_id, cat.animal_id);
}

#[tokio::test]
async fn removed_rescuer_keeps_history() {
  let s = store().await;
  let ada = s.create_account(informant("ada")).await.unwrap();
  let paws = s.create_account(organization("paws")).await.unwrap();
  let ravi = s.create_account(rescuer("ravi", paws.account_id)).await.unwrap();
  let dog = s.create_animal(stray(ada.account_id, "dog")).await.unwrap();
  s.assign_rescue(dog.animal_id, ravi.account_id, paws.account_id).await.unwrap();

  s.delete_rescuer(paws.account_id, ravi.account_id).await.unwrap();
  assert_eq!(s.list_rescued_by_org(paws.account_id).await.unwrap().len(), 1);
}

// ─── Rescue reports ──────────────────────────────────────────────────────────

fn report(animal_id: Uuid, org_id: Uuid) -> NewReport {
  NewReport {
    animal_id,
    org_id,
    description:        "Recovered and vaccinated.".into(),
    rescued_animal_pic: "/media/after.png".into(),
  }
}

#[tokio::test]
async fn report_requires_a_rescue_by_the_organization() {
  let s = store().await;
  let ada = s.create_account(informant("ada")).await.unwrap();
  let paws = s.create_account(organization("paws")).await.unwrap();
  let claws = s.create_account(organization("claws")).await.unwrap();
  let ravi = s.create_account(rescuer("ravi", paws.account_id)).await.unwrap();
  let dog = s.create_animal(stray(ada.account_id, "dog")).await.unwrap();

  let err = core(s.file_report(report(dog.animal_id, paws.account_id)).await.unwrap_err());
  assert!(matches!(err, rescue_core::Error::NoRescueRecord { .. }));

  s.assign_rescue(dog.animal_id, ravi.account_id, paws.account_id).await.unwrap();

  let err = core(s.file_report(report(dog.animal_id, claws.account_id)).await.unwrap_err());
  assert!(matches!(err, rescue_core::Error::NoRescueRecord { .. }));

  let filed = s.file_report(report(dog.animal_id, paws.account_id)).await.unwrap();
  assert_eq!(filed.org_id, paws.account_id);

  let err = core(s.file_report(report(Uuid::new_v4(), paws.account_id)).await.unwrap_err());
  assert!(matches!(err, rescue_core::Error::NotFound { .. }));
}

#[tokio::test]
async fn one_report_per_animal() {
  let s = store().await;
  let ada = s.create_account(informant("ada")).await.unwrap();
  let paws = s.create_account(organization("paws")).await.unwrap();
  let ravi = s.create_account(rescuer("ravi", paws.account_id)).await.unwrap();
  let dog = s.create_animal(stray(ada.account_id, "dog")).await.unwrap();
  s.assign_rescue(dog.animal_id, ravi.account_id, paws.account_id).await.unwrap();

  let filed = s.file_report(report(dog.animal_id, paws.account_id)).await.unwrap();
  let err = core(s.file_report(report(dog.animal_id, paws.account_id)).await.unwrap_err());
  assert!(matches!(err, rescue_core::Error::ReportExists(id) if id == dog.animal_id));

  let fetched = s.get_report(dog.animal_id).await.unwrap().unwrap();
  assert_eq!(fetched, filed);
  assert!(s.get_report(Uuid::new_v4()).await.unwrap().is_none());
}
