//! Contact persistence and search. Every query is scoped to the owning
//! user; an absent row is a normal `None` result, never an error.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use sqlx::PgPool;
use std::collections::HashSet;

use crate::db::models::Contact;

/// Mutable contact fields, applied as a full replace on update.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ContactFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birthday: String,
    #[serde(default)]
    pub additional_data: String,
}

/// Lower-case then capitalize the first letter only, mirroring how names
/// are stored. Empty or whitespace-only input counts as no filter.
fn normalize_name(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let lower = raw.to_lowercase();
    let mut chars = lower.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().collect::<String>() + chars.as_str())
}

fn normalize_email(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    Some(raw.to_lowercase())
}

/// Union of the per-filter result sets: dedupe by id, first-seen order wins.
fn merge_union(batches: Vec<Vec<Contact>>) -> Vec<Contact> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for contact in batches.into_iter().flatten() {
        if seen.insert(contact.id) {
            merged.push(contact);
        }
    }
    merged
}

/// True when the stored birthday, re-anchored onto `today`'s year, falls
/// within the next seven calendar days starting at `today`. The stored
/// year is ignored: a birthday is a recurring annual event. Feb 29
/// re-anchored onto a non-leap year resolves to Mar 1.
fn birthday_in_window(birthday: &str, today: NaiveDate) -> bool {
    let mut parts = birthday.splitn(3, '-');
    let _year = parts.next();
    let (Some(month), Some(day)) = (parts.next(), parts.next()) else {
        return false;
    };
    let (Ok(month), Ok(day)) = (month.parse::<u32>(), day.parse::<u32>()) else {
        return false;
    };
    let anchored = NaiveDate::from_ymd_opt(today.year(), month, day).or_else(|| {
        if month == 2 && day == 29 {
            NaiveDate::from_ymd_opt(today.year(), 3, 1)
        } else {
            None
        }
    });
    match anchored {
        Some(date) => today <= date && date < today + Duration::days(7),
        None => false,
    }
}

#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_field(
        &self,
        column: &'static str,
        value: &str,
        owner_id: i64,
    ) -> Result<Vec<Contact>, sqlx::Error> {
        let sql = match column {
            "first_name" => {
                "SELECT id, user_id, first_name, last_name, email, phone_number, birthday, additional_data \
                 FROM contacts WHERE first_name = $1 AND user_id = $2 ORDER BY id"
            }
            "last_name" => {
                "SELECT id, user_id, first_name, last_name, email, phone_number, birthday, additional_data \
                 FROM contacts WHERE last_name = $1 AND user_id = $2 ORDER BY id"
            }
            _ => {
                "SELECT id, user_id, first_name, last_name, email, phone_number, birthday, additional_data \
                 FROM contacts WHERE email = $1 AND user_id = $2 ORDER BY id"
            }
        };
        sqlx::query_as::<_, Contact>(sql)
            .bind(value)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
    }

    /// Filtered listing. Supplied filters combine with union semantics: a
    /// contact matching any one of them is included. With no filters this
    /// is a plain paged listing in insertion order; paging does not apply
    /// on the filtered path.
    pub async fn list(
        &self,
        limit: i64,
        offset: i64,
        first_name: Option<&str>,
        last_name: Option<&str>,
        email: Option<&str>,
        owner_id: i64,
    ) -> Result<Vec<Contact>, sqlx::Error> {
        let first_name = normalize_name(first_name);
        let last_name = normalize_name(last_name);
        let email = normalize_email(email);

        if first_name.is_none() && last_name.is_none() && email.is_none() {
            return sqlx::query_as::<_, Contact>(
                "SELECT id, user_id, first_name, last_name, email, phone_number, birthday, additional_data \
                 FROM contacts WHERE user_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
            )
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        }

        let mut batches = Vec::new();
        if let Some(value) = first_name {
            batches.push(self.find_by_field("first_name", &value, owner_id).await?);
        }
        if let Some(value) = last_name {
            batches.push(self.find_by_field("last_name", &value, owner_id).await?);
        }
        if let Some(value) = email {
            batches.push(self.find_by_field("email", &value, owner_id).await?);
        }
        Ok(merge_union(batches))
    }

    pub async fn get_by_id(
        &self,
        contact_id: i64,
        owner_id: i64,
    ) -> Result<Option<Contact>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            "SELECT id, user_id, first_name, last_name, email, phone_number, birthday, additional_data \
             FROM contacts WHERE id = $1 AND user_id = $2",
        )
        .bind(contact_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Contacts with a birthday in the next seven days. Paging is applied
    /// before the window filter, so the filter only sees the fetched page;
    /// that ordering is part of the documented contract.
    pub async fn birthdays(
        &self,
        limit: i64,
        offset: i64,
        owner_id: i64,
    ) -> Result<Vec<Contact>, sqlx::Error> {
        let page = sqlx::query_as::<_, Contact>(
            "SELECT id, user_id, first_name, last_name, email, phone_number, birthday, additional_data \
             FROM contacts WHERE user_id = $1 ORDER BY id LIMIT $2 OFFSET $3",
        )
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let today = Utc::now().date_naive();
        Ok(page
            .into_iter()
            .filter(|contact| birthday_in_window(&contact.birthday, today))
            .collect())
    }

    pub async fn create(
        &self,
        fields: &ContactFields,
        owner_id: i64,
    ) -> Result<Contact, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (user_id, first_name, last_name, email, phone_number, birthday, additional_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, first_name, last_name, email, phone_number, birthday, additional_data
            "#,
        )
        .bind(owner_id)
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.email)
        .bind(&fields.phone_number)
        .bind(&fields.birthday)
        .bind(&fields.additional_data)
        .fetch_one(&self.pool)
        .await
    }

    /// Full replace of all mutable fields. Absent rows produce `None`
    /// without any write.
    pub async fn update(
        &self,
        contact_id: i64,
        fields: &ContactFields,
        owner_id: i64,
    ) -> Result<Option<Contact>, sqlx::Error> {
        if self.get_by_id(contact_id, owner_id).await?.is_none() {
            return Ok(None);
        }
        sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts
            SET first_name = $1, last_name = $2, email = $3, phone_number = $4, birthday = $5, additional_data = $6
            WHERE id = $7 AND user_id = $8
            RETURNING id, user_id, first_name, last_name, email, phone_number, birthday, additional_data
            "#,
        )
        .bind(&fields.first_name)
        .bind(&fields.last_name)
        .bind(&fields.email)
        .bind(&fields.phone_number)
        .bind(&fields.birthday)
        .bind(&fields.additional_data)
        .bind(contact_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Delete and return the pre-deletion snapshot.
    pub async fn remove(
        &self,
        contact_id: i64,
        owner_id: i64,
    ) -> Result<Option<Contact>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            "DELETE FROM contacts WHERE id = $1 AND user_id = $2 \
             RETURNING id, user_id, first_name, last_name, email, phone_number, birthday, additional_data",
        )
        .bind(contact_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: i64, first_name: &str) -> Contact {
        Contact {
            id,
            user_id: 1,
            first_name: first_name.to_string(),
            last_name: "Gnatiuk".to_string(),
            email: format!("c{id}@example.com"),
            phone_number: "+380678742845".to_string(),
            birthday: "1976-03-07".to_string(),
            additional_data: String::new(),
        }
    }

    #[test]
    fn test_normalize_name_capitalizes_first_letter_only() {
        assert_eq!(normalize_name(Some("oleksandr")).as_deref(), Some("Oleksandr"));
        assert_eq!(normalize_name(Some("OLEKSANDR")).as_deref(), Some("Oleksandr"));
        assert_eq!(normalize_name(Some("oLeKsAnDr")).as_deref(), Some("Oleksandr"));
    }

    #[test]
    fn test_normalize_name_empty_is_absent() {
        assert_eq!(normalize_name(None), None);
        assert_eq!(normalize_name(Some("")), None);
        assert_eq!(normalize_name(Some("   ")), None);
    }

    #[test]
    fn test_normalize_email_lowercases() {
        assert_eq!(
            normalize_email(Some("X@Y.Com")).as_deref(),
            Some("x@y.com")
        );
        assert_eq!(normalize_email(Some("")), None);
    }

    #[test]
    fn test_merge_union_dedupes_preserving_first_seen_order() {
        let a = vec![contact(1, "Oleksandr"), contact(2, "Taras")];
        let b = vec![contact(2, "Taras"), contact(3, "Lesya")];
        let merged = merge_union(vec![a, b]);
        let ids: Vec<i64> = merged.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_merge_union_empty_batches() {
        assert!(merge_union(vec![]).is_empty());
        assert!(merge_union(vec![vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_birthday_window_boundaries() {
        // Seven calendar days starting at today: with today = 01-01 the
        // window covers 01-01 through 01-07, and 01-08 is the first day out.
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        // Stored year is ignored entirely.
        assert!(birthday_in_window("1990-01-01", today));
        assert!(birthday_in_window("1985-01-07", today));
        assert!(!birthday_in_window("2000-01-08", today));
        assert!(!birthday_in_window("1990-12-31", today));
    }

    #[test]
    fn test_feb_29_maps_to_mar_1_on_non_leap_year() {
        // 2023 is not a leap year; Feb 29 must not panic and resolves to Mar 1.
        let today = NaiveDate::from_ymd_opt(2023, 2, 26).unwrap();
        assert!(birthday_in_window("1996-02-29", today));
        let far = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        assert!(!birthday_in_window("1996-02-29", far));
    }

    #[test]
    fn test_feb_29_kept_on_leap_year() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 25).unwrap();
        assert!(birthday_in_window("1996-02-29", today));
    }

    #[test]
    fn test_malformed_birthday_is_excluded() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(!birthday_in_window("not-a-date", today));
        assert!(!birthday_in_window("2024", today));
        assert!(!birthday_in_window("", today));
    }

    #[test]
    fn test_no_window_wrap_across_year_end() {
        // Re-anchoring uses the current year only: a January birthday does
        // not match a window that starts in late December.
        let today = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert!(!birthday_in_window("1990-01-02", today));
    }
}
