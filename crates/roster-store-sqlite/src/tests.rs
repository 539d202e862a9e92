//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate, Utc};
use roster_core::{
  page::PageRequest,
  person::{Person, PersonInput, shift_years},
  store::{AgeRange, PersonQuery, PersonStore, SortField},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn today() -> NaiveDate { Utc::now().date_naive() }

fn input(first: &str, last: &str, dob: NaiveDate) -> PersonInput {
  PersonInput {
    first_name:    first.into(),
    last_name:     last.into(),
    date_of_birth: dob,
  }
}

fn born_years_ago(years: i32) -> NaiveDate {
  shift_years(today(), -years).unwrap()
}

fn query(page: i64, page_size: i64) -> PersonQuery {
  PersonQuery {
    page: PageRequest::new(page, page_size).unwrap(),
    ..PersonQuery::default()
  }
}

// ─── CRUD ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_person() {
  let s = store().await;
  let dob = NaiveDate::from_ymd_opt(1995, 1, 1).unwrap();

  let created = s.create_person(input("Unit", "Test", dob), "Tester").await.unwrap();
  assert_eq!(created.created_by.as_deref(), Some("Tester"));

  let fetched = s.get_person(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.date_of_birth, dob);
}

#[tokio::test]
async fn get_person_missing_returns_none() {
  let s = store().await;
  assert!(s.get_person(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn update_overwrites_fields_and_stamps_audit() {
  let s = store().await;
  let p = s
    .create_person(input("Unit", "Test", born_years_ago(30)), "Creator")
    .await
    .unwrap();

  let updated = s
    .update_person(p.id, input("Unit", "Tester", born_years_ago(31)), "Editor")
    .await
    .unwrap()
    .unwrap();

  assert_eq!(updated.last_name, "Tester");
  assert_eq!(updated.date_of_birth, born_years_ago(31));
  assert_eq!(updated.updated_by.as_deref(), Some("Editor"));
  assert!(updated.updated_at.is_some());
  assert_eq!(updated.created_at, p.created_at);
  assert_eq!(updated.created_by.as_deref(), Some("Creator"));
}

#[tokio::test]
async fn update_missing_returns_none() {
  let s = store().await;
  let result = s
    .update_person(Uuid::new_v4(), input("A", "B", born_years_ago(20)), "x")
    .await
    .unwrap();
  assert!(result.is_none());
}

// ─── Soft delete / restore ───────────────────────────────────────────────────

#[tokio::test]
async fn soft_delete_hides_person() {
  let s = store().await;
  let p = s.create_person(input("Gone", "Soon", born_years_ago(40)), "a").await.unwrap();

  assert!(s.soft_delete_person(p.id, "Remover").await.unwrap());
  assert!(s.get_person(p.id).await.unwrap().is_none());
  assert_eq!(s.list_people(&query(1, 10), today()).await.unwrap().total_count, 0);

  let all = s.all_people(true).await.unwrap();
  assert_eq!(all.len(), 1);
  assert!(all[0].is_deleted);
  assert_eq!(all[0].deleted_by.as_deref(), Some("Remover"));
  assert!(all[0].deleted_at.is_some());
  assert!(s.all_people(false).await.unwrap().is_empty());
}

#[tokio::test]
async fn second_delete_is_not_found() {
  let s = store().await;
  let p = s.create_person(input("Twice", "Deleted", born_years_ago(40)), "a").await.unwrap();
  assert!(s.soft_delete_person(p.id, "a").await.unwrap());
  assert!(!s.soft_delete_person(p.id, "a").await.unwrap());
}

#[tokio::test]
async fn update_of_deleted_person_is_not_found() {
  let s = store().await;
  let p = s.create_person(input("Del", "Eted", born_years_ago(40)), "a").await.unwrap();
  s.soft_delete_person(p.id, "a").await.unwrap();
  let result = s
    .update_person(p.id, input("New", "Name", born_years_ago(40)), "a")
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn restore_brings_back_original_record() {
  let s = store().await;
  let p = s.create_person(input("Back", "Again", born_years_ago(35)), "a").await.unwrap();
  s.soft_delete_person(p.id, "b").await.unwrap();

  let restored = s.restore_person(p.id).await.unwrap().unwrap();
  assert_eq!(restored, p);
  assert!(!restored.is_deleted);
  assert!(restored.deleted_at.is_none());
  assert!(restored.deleted_by.is_none());
  assert_eq!(s.get_person(p.id).await.unwrap(), Some(p));
}

#[tokio::test]
async fn restore_unknown_id_returns_none() {
  let s = store().await;
  assert!(s.restore_person(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn paging_over_twenty_five_people() {
  let s = store().await;
  for i in 0..25 {
    s.create_person(input(&format!("P{i}"), "Page", born_years_ago(30)), "a")
      .await
      .unwrap();
  }

  let page = s.list_people(&query(2, 10), today()).await.unwrap();
  assert_eq!(page.items.len(), 10);
  assert_eq!(page.total_count, 25);
  assert_eq!(page.total_pages(), 3);
  assert!(page.has_next_page());
  assert!(page.has_previous_page());

  let last = s.list_people(&query(3, 10), today()).await.unwrap();
  assert_eq!(last.items.len(), 5);
  assert!(!last.has_next_page());
}

#[tokio::test]
async fn default_order_is_creation_order() {
  let s = store().await;
  let now = Utc::now();
  let a = Person::new(input("First", "A", born_years_ago(30)), "a", now - Duration::hours(2));
  let b = Person::new(input("Second", "B", born_years_ago(30)), "a", now - Duration::hours(1));
  // Inserted newest first, so row order alone cannot satisfy the assertions.
  s.insert_person(&b).await.unwrap();
  s.insert_person(&a).await.unwrap();

  let asc = s.list_people(&query(1, 10), today()).await.unwrap();
  let ids: Vec<Uuid> = asc.items.iter().map(|p| p.id).collect();
  assert_eq!(ids, vec![a.id, b.id]);

  let desc = s
    .list_people(&PersonQuery { descending: true, ..query(1, 10) }, today())
    .await
    .unwrap();
  let ids: Vec<Uuid> = desc.items.iter().map(|p| p.id).collect();
  assert_eq!(ids, vec![b.id, a.id]);
}

#[tokio::test]
async fn equal_creation_times_break_ties_by_id() {
  let s = store().await;
  let at = Utc::now() - Duration::hours(1);
  let mut people: Vec<Person> = (0..3)
    .map(|i| Person::new(input(&format!("P{i}"), "Tie", born_years_ago(30)), "a", at))
    .collect();
  for p in &people {
    s.insert_person(p).await.unwrap();
  }
  people.sort_by_key(|p| p.id.to_string());

  let asc = s.list_people(&query(1, 10), today()).await.unwrap();
  let ids: Vec<Uuid> = asc.items.iter().map(|p| p.id).collect();
  assert_eq!(ids, people.iter().map(|p| p.id).collect::<Vec<_>>());
}

#[tokio::test]
async fn search_matches_either_name_case_insensitively() {
  let s = store().await;
  s.create_person(input("Anna", "Smith", born_years_ago(30)), "a").await.unwrap();
  s.create_person(input("Bob", "Hannah", born_years_ago(30)), "a").await.unwrap();
  s.create_person(input("Carl", "Jones", born_years_ago(30)), "a").await.unwrap();

  let q = PersonQuery { search: Some("ANN".into()), ..query(1, 10) };
  let page = s.list_people(&q, today()).await.unwrap();
  assert_eq!(page.total_count, 2);
  let mut firsts: Vec<&str> = page.items.iter().map(|p| p.first_name.as_str()).collect();
  firsts.sort_unstable();
  assert_eq!(firsts, vec!["Anna", "Bob"]);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
  let s = store().await;
  s.create_person(input("Anna", "Smith", born_years_ago(30)), "a").await.unwrap();

  let q = PersonQuery { search: Some("%".into()), ..query(1, 10) };
  assert_eq!(s.list_people(&q, today()).await.unwrap().total_count, 0);

  let blank = PersonQuery { search: Some("   ".into()), ..query(1, 10) };
  assert_eq!(s.list_people(&blank, today()).await.unwrap().total_count, 1);
}

#[tokio::test]
async fn sort_by_name() {
  let s = store().await;
  for name in ["charlie", "Alice", "bob"] {
    s.create_person(input(name, "X", born_years_ago(30)), "a").await.unwrap();
  }

  let q = PersonQuery { sort_by: SortField::FirstName, ..query(1, 10) };
  let page = s.list_people(&q, today()).await.unwrap();
  let names: Vec<&str> = page.items.iter().map(|p| p.first_name.as_str()).collect();
  assert_eq!(names, vec!["Alice", "bob", "charlie"]);

  let q = PersonQuery { sort_by: SortField::FirstName, descending: true, ..query(1, 10) };
  let page = s.list_people(&q, today()).await.unwrap();
  assert_eq!(page.items[0].first_name, "charlie");
}

#[tokio::test]
async fn sort_by_age_puts_youngest_first() {
  let s = store().await;
  s.create_person(input("Middle", "X", born_years_ago(40)), "a").await.unwrap();
  s.create_person(input("Young", "X", born_years_ago(20)), "a").await.unwrap();
  s.create_person(input("Old", "X", born_years_ago(60)), "a").await.unwrap();

  let q = PersonQuery { sort_by: SortField::Age, ..query(1, 10) };
  let page = s.list_people(&q, today()).await.unwrap();
  let names: Vec<&str> = page.items.iter().map(|p| p.first_name.as_str()).collect();
  assert_eq!(names, vec!["Young", "Middle", "Old"]);

  let q = PersonQuery { sort_by: SortField::Age, descending: true, ..query(1, 10) };
  let page = s.list_people(&q, today()).await.unwrap();
  assert_eq!(page.items[0].first_name, "Old");
}

#[tokio::test]
async fn age_filter_applies_before_counting_and_paging() {
  let s = store().await;
  for years in [20, 25, 30, 35, 40, 45, 50] {
    s.create_person(input("Aged", "X", born_years_ago(years)), "a").await.unwrap();
  }

  let q = PersonQuery {
    age: AgeRange { min: Some(25), max: Some(40) },
    ..query(1, 2)
  };
  let page = s.list_people(&q, today()).await.unwrap();
  assert_eq!(page.total_count, 4);
  assert_eq!(page.items.len(), 2);
  assert_eq!(page.total_pages(), 2);
  assert!(page.items.iter().all(|p| (25..=40).contains(&p.age_on(today()))));
}

#[tokio::test]
async fn age_filter_bounds_are_inclusive() {
  let s = store().await;
  s.create_person(input("Exactly", "Thirty", born_years_ago(30)), "a").await.unwrap();

  let at_min = PersonQuery { age: AgeRange { min: Some(30), max: None }, ..query(1, 10) };
  let at_max = PersonQuery { age: AgeRange { min: None, max: Some(30) }, ..query(1, 10) };
  let above = PersonQuery { age: AgeRange { min: Some(31), max: None }, ..query(1, 10) };
  assert_eq!(s.list_people(&at_min, today()).await.unwrap().total_count, 1);
  assert_eq!(s.list_people(&at_max, today()).await.unwrap().total_count, 1);
  assert_eq!(s.list_people(&above, today()).await.unwrap().total_count, 0);
}

// ─── Seeding ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seed_only_fills_an_empty_store() {
  let s = store().await;
  assert_eq!(s.seed_demo_people().await.unwrap(), 7);
  assert_eq!(s.seed_demo_people().await.unwrap(), 0);

  let all = s.all_people(false).await.unwrap();
  assert_eq!(all.len(), 7);
  let bob = all.iter().find(|p| p.first_name == "Bob").unwrap();
  assert_eq!(bob.updated_by.as_deref(), Some("Admin"));
}

#[tokio::test]
async fn open_accepts_memory_path() {
  let s = SqliteStore::open(":memory:").await.unwrap();
  assert!(s.all_people(true).await.unwrap().is_empty());
}
