//! [`SqliteStore`]: the SQLite implementation of [`RescueStore`].

use std::path::Path;

use chrono::Utc;
use rescue_core::{
  Entity,
  account::{Account, AccountKind, Credential, NewAccount},
  animal::{Animal, NewAnimal},
  report::{NewReport, RescueReport},
  rescue::{OrgRescue, RescueAssignment, RescuerTally},
  store::{AnimalQuery, RescueStore},
};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ACCOUNT_COLUMNS, ANIMAL_COLUMNS, RawAccount, RawAnimal, RawAssignment,
    RawOrgRescue, RawReport, encode_dt, encode_gender, encode_kind,
    encode_profile, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// The message of a `UNIQUE` constraint failure, if that is what `err` is.
fn unique_violation(err: &rusqlite::Error) -> Option<&str> {
  match err {
    rusqlite::Error::SqliteFailure(e, Some(msg))
      if e.code == rusqlite::ErrorCode::ConstraintViolation
        && msg.starts_with("UNIQUE constraint failed") =>
    {
      Some(msg)
    }
    _ => None,
  }
}

/// Map a unique-index violation on `accounts` back to the request field.
fn duplicate_field(message: &str, kind: AccountKind) -> &'static str {
  if message.contains("accounts.email") {
    "email"
  } else if message.contains("accounts.phone_number") {
    "phoneNumber"
  } else if message.contains("accounts.handle") {
    match kind {
      AccountKind::Rescuer => "rescuerName",
      _ => "username",
    }
  } else {
    "account"
  }
}

/// Qualify every column of a column list with a table alias.
fn qualified(columns: &str, alias: &str) -> String {
  columns
    .split(',')
    .map(|c| format!("{alias}.{}", c.trim()))
    .collect::<Vec<_>>()
    .join(", ")
}

/// The JSON path of the image field inside `profile_json`.
fn image_path(kind: AccountKind) -> &'static str {
  match kind {
    AccountKind::Organization => "$.logo",
    AccountKind::Informant | AccountKind::Rescuer => "$.avatar",
  }
}

/// Result of the conditional status flip in [`SqliteStore::assign_rescue`].
enum Flip {
  Done,
  Missing,
  AlreadyRescued,
}

/// Result of the checked insert in [`SqliteStore::file_report`].
enum Filing {
  Done,
  MissingAnimal,
  NoRescue,
  Duplicate,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A rescue store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    debug!("sqlite schema initialised");
    Ok(())
  }

  async fn query_accounts(
    &self,
    sql: String,
    params: Vec<String>,
  ) -> Result<Vec<Account>> {
    let raws: Vec<RawAccount> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawAccount::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAccount::into_account).collect()
  }

  async fn query_animals(
    &self,
    sql: String,
    params: Vec<String>,
  ) -> Result<Vec<Animal>> {
    let raws: Vec<RawAnimal> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawAnimal::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAnimal::into_animal).collect()
  }
}

// ─── RescueStore impl ────────────────────────────────────────────────────────

impl RescueStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_account(&self, input: NewAccount) -> Result<Account> {
    let now = Utc::now();
    let account = Account {
      account_id:    Uuid::new_v4(),
      email:         input.email,
      phone_number:  input.phone_number,
      password_hash: input.password_hash,
      refresh_token: None,
      profile:       input.profile,
      created_at:    now,
      updated_at:    now,
    };
    let kind = account.kind();

    let id_str       = encode_uuid(account.account_id);
    let kind_str     = encode_kind(kind);
    let email        = account.email.clone();
    let phone        = account.phone_number.clone();
    let handle       = account.profile.handle().map(str::to_owned);
    let org_id_str   = account.profile.org_id().map(encode_uuid);
    let hash         = account.password_hash.clone();
    let profile_json = encode_profile(&account.profile)?;
    let at_str       = encode_dt(now);

    let violation: Option<String> = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT INTO accounts (
             account_id, kind, email, phone_number, handle, org_id,
             password_hash, refresh_token, profile_json, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?9, ?9)",
          rusqlite::params![
            id_str,
            kind_str,
            email,
            phone,
            handle,
            org_id_str,
            hash,
            profile_json,
            at_str,
          ],
        );
        match inserted {
          Ok(_) => Ok(None),
          Err(e) => match unique_violation(&e) {
            Some(msg) => Ok(Some(msg.to_owned())),
            None => Err(e.into()),
          },
        }
      })
      .await?;

    if let Some(msg) = violation {
      let field = duplicate_field(&msg, kind);
      return Err(rescue_core::Error::Duplicate(field.to_owned()).into());
    }
    Ok(account)
  }

  async fn get_account(&self, kind: AccountKind, id: Uuid) -> Result<Option<Account>> {
    let sql = format!(
      "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1 AND kind = ?2"
    );
    let mut found = self
      .query_accounts(sql, vec![encode_uuid(id), encode_kind(kind)])
      .await?;
    Ok(found.pop())
  }

  async fn find_account<'a>(
    &'a self,
    kind:       AccountKind,
    credential: &'a Credential,
  ) -> Result<Option<Account>> {
    let (column, value) = match credential {
      Credential::Email(email) => ("email", email.clone()),
      Credential::Username(username) => ("handle", username.clone()),
    };
    let sql = format!(
      "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE kind = ?1 AND {column} = ?2"
    );
    let mut found = self.query_accounts(sql, vec![encode_kind(kind), value]).await?;
    Ok(found.pop())
  }

  async fn set_refresh_token(
    &self,
    kind:  AccountKind,
    id:    Uuid,
    token: Option<String>,
  ) -> Result<()> {
    let id_str   = encode_uuid(id);
    let kind_str = encode_kind(kind);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE accounts SET refresh_token = ?3 WHERE account_id = ?1 AND kind = ?2",
          rusqlite::params![id_str, kind_str, token],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn rotate_refresh_token(
    &self,
    kind:        AccountKind,
    id:          Uuid,
    expected:    String,
    replacement: String,
  ) -> Result<bool> {
    let id_str   = encode_uuid(id);
    let kind_str = encode_kind(kind);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE accounts SET refresh_token = ?4
           WHERE account_id = ?1 AND kind = ?2 AND refresh_token = ?3",
          rusqlite::params![id_str, kind_str, expected, replacement],
        )?)
      })
      .await?;
    Ok(changed == 1)
  }

  async fn set_password_hash(
    &self,
    kind:          AccountKind,
    id:            Uuid,
    password_hash: String,
  ) -> Result<()> {
    let id_str   = encode_uuid(id);
    let kind_str = encode_kind(kind);
    let at_str   = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE accounts SET password_hash = ?3, updated_at = ?4
           WHERE account_id = ?1 AND kind = ?2",
          rusqlite::params![id_str, kind_str, password_hash, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(rescue_core::Error::not_found(Entity::Account(kind), id).into());
    }
    Ok(())
  }

  async fn replace_image(
    &self,
    kind: AccountKind,
    id:   Uuid,
    url:  String,
  ) -> Result<(Account, String)> {
    let id_str   = encode_uuid(id);
    let kind_str = encode_kind(kind);
    let at_str   = encode_dt(Utc::now());
    let path     = image_path(kind);
    let select   = format!(
      "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1 AND kind = ?2"
    );

    let raws: Option<(RawAccount, RawAccount)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let before = tx
          .query_row(&select, rusqlite::params![id_str, kind_str], RawAccount::from_row)
          .optional()?;
        let Some(before) = before else {
          return Ok(None);
        };
        tx.execute(
          "UPDATE accounts
           SET profile_json = json_set(profile_json, ?3, ?4), updated_at = ?5
           WHERE account_id = ?1 AND kind = ?2",
          rusqlite::params![id_str, kind_str, path, url, at_str],
        )?;
        let after =
          tx.query_row(&select, rusqlite::params![id_str, kind_str], RawAccount::from_row)?;
        tx.commit()?;
        Ok(Some((before, after)))
      })
      .await?;

    let Some((before, after)) = raws else {
      return Err(rescue_core::Error::not_found(Entity::Account(kind), id).into());
    };
    let previous = before.into_account()?.profile.image().to_owned();
    Ok((after.into_account()?, previous))
  }

  async fn list_rescuers(&self, org_id: Uuid) -> Result<Vec<Account>> {
    let sql = format!(
      "SELECT {ACCOUNT_COLUMNS} FROM accounts
       WHERE kind = ?1 AND org_id = ?2
       ORDER BY created_at, rowid"
    );
    self
      .query_accounts(sql, vec![encode_kind(AccountKind::Rescuer), encode_uuid(org_id)])
      .await
  }

  async fn delete_rescuer(&self, org_id: Uuid, rescuer_id: Uuid) -> Result<Option<Account>> {
    let sql = format!(
      "DELETE FROM accounts
       WHERE account_id = ?1 AND kind = ?2 AND org_id = ?3
       RETURNING {ACCOUNT_COLUMNS}"
    );
    let id_str     = encode_uuid(rescuer_id);
    let kind_str   = encode_kind(AccountKind::Rescuer);
    let org_id_str = encode_uuid(org_id);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params![id_str, kind_str, org_id_str],
              RawAccount::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  // ── Animal registry ───────────────────────────────────────────────────────

  async fn create_animal(&self, input: NewAnimal) -> Result<Animal> {
    let now = Utc::now();
    let attrs = input.attributes;
    let animal = Animal {
      animal_id:      Uuid::new_v4(),
      animal_type:    attrs.animal_type,
      breed:          attrs.breed,
      age:            attrs.age,
      gender:         attrs.gender,
      health_status:  attrs.health_status,
      location:       attrs.location,
      animal_picture: input.animal_picture,
      rescue_status:  false,
      informant_id:   input.informant_id,
      created_at:     now,
      updated_at:     now,
    };

    let id_str        = encode_uuid(animal.animal_id);
    let animal_type   = animal.animal_type.clone();
    let breed         = animal.breed.clone();
    let age           = animal.age;
    let gender        = encode_gender(animal.gender);
    let health_status = animal.health_status.clone();
    let location      = animal.location.clone();
    let picture       = animal.animal_picture.clone();
    let informant_str = encode_uuid(animal.informant_id);
    let at_str        = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO animals (
             animal_id, animal_type, breed, age, gender, health_status,
             location, animal_picture, rescue_status, informant_id,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10, ?10)",
          rusqlite::params![
            id_str,
            animal_type,
            breed,
            age,
            gender,
            health_status,
            location,
            picture,
            informant_str,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(animal)
  }

  async fn get_animal(&self, id: Uuid) -> Result<Option<Animal>> {
    let sql = format!("SELECT {ANIMAL_COLUMNS} FROM animals WHERE animal_id = ?1");
    let mut found = self.query_animals(sql, vec![encode_uuid(id)]).await?;
    Ok(found.pop())
  }

  async fn list_animals(&self, query: AnimalQuery) -> Result<Vec<Animal>> {
    let sql = format!(
      "SELECT {ANIMAL_COLUMNS} FROM animals
       WHERE (?1 IS NULL OR rescue_status = ?1)
       ORDER BY created_at DESC, rowid DESC
       LIMIT ?2 OFFSET ?3"
    );
    let status = query.rescue_status();
    let limit  = i64::from(query.page_size());
    let offset = i64::try_from(query.skip()).unwrap_or(i64::MAX);

    let raws: Vec<RawAnimal> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![status, limit, offset], RawAnimal::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAnimal::into_animal).collect()
  }

  async fn list_animals_by_informant(&self, informant_id: Uuid) -> Result<Vec<Animal>> {
    let sql = format!(
      "SELECT {ANIMAL_COLUMNS} FROM animals WHERE informant_id = ?1 ORDER BY rowid"
    );
    self.query_animals(sql, vec![encode_uuid(informant_id)]).await
  }

  // ── Rescue ledger ─────────────────────────────────────────────────────────

  async fn assign_rescue(
    &self,
    animal_id:  Uuid,
    rescuer_id: Uuid,
    org_id:     Uuid,
  ) -> Result<RescueAssignment> {
    let assignment = RescueAssignment {
      assignment_id: Uuid::new_v4(),
      animal_id,
      rescuer_id,
      org_id,
      rescued_at: Utc::now(),
    };

    let assignment_str = encode_uuid(assignment.assignment_id);
    let animal_str     = encode_uuid(animal_id);
    let rescuer_str    = encode_uuid(rescuer_id);
    let org_str        = encode_uuid(org_id);
    let at_str         = encode_dt(assignment.rescued_at);

    let flip = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // The check and the flip are one statement: of two racing callers,
        // only one can observe `rescue_status = 0`.
        let flipped = tx.execute(
          "UPDATE animals SET rescue_status = 1, updated_at = ?2
           WHERE animal_id = ?1 AND rescue_status = 0",
          rusqlite::params![animal_str, at_str],
        )?;
        if flipped == 0 {
          let exists = tx
            .query_row(
              "SELECT 1 FROM animals WHERE animal_id = ?1",
              rusqlite::params![animal_str],
              |_| Ok(()),
            )
            .optional()?
            .is_some();
          return Ok(if exists { Flip::AlreadyRescued } else { Flip::Missing });
        }

        tx.execute(
          "INSERT INTO rescue_assignments (
             assignment_id, animal_id, rescuer_id, org_id, rescued_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![assignment_str, animal_str, rescuer_str, org_str, at_str],
        )?;
        tx.commit()?;
        Ok(Flip::Done)
      })
      .await?;

    match flip {
      Flip::Done => Ok(assignment),
      Flip::Missing => Err(rescue_core::Error::not_found(Entity::Animal, animal_id).into()),
      Flip::AlreadyRescued => Err(rescue_core::Error::AlreadyRescued(animal_id).into()),
    }
  }

  async fn list_rescued_by_rescuer(&self, rescuer_id: Uuid) -> Result<RescuerTally> {
    let sql = format!(
      "SELECT {} FROM rescue_assignments r
       JOIN animals a ON a.animal_id = r.animal_id
       WHERE r.rescuer_id = ?1
       ORDER BY r.rescued_at, r.rowid",
      qualified(ANIMAL_COLUMNS, "a"),
    );
    let animals = self.query_animals(sql, vec![encode_uuid(rescuer_id)]).await?;
    Ok(RescuerTally::from(
      animals.iter().map(Animal::summary).collect::<Vec<_>>(),
    ))
  }

  async fn list_rescued_by_org(&self, org_id: Uuid) -> Result<Vec<OrgRescue>> {
    let sql = format!(
      "SELECT r.assignment_id, r.animal_id, r.rescuer_id, r.org_id, r.rescued_at,
              {}, o.profile_json
       FROM rescue_assignments r
       JOIN animals  a ON a.animal_id  = r.animal_id
       JOIN accounts o ON o.account_id = r.org_id AND o.kind = ?2
       WHERE r.org_id = ?1
       ORDER BY r.rescued_at DESC, r.rowid DESC",
      qualified(ANIMAL_COLUMNS, "a"),
    );
    let org_str  = encode_uuid(org_id);
    let kind_str = encode_kind(AccountKind::Organization);

    let raws: Vec<RawOrgRescue> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![org_str, kind_str], |row| {
            Ok(RawOrgRescue {
              assignment: RawAssignment {
                assignment_id: row.get(0)?,
                animal_id:     row.get(1)?,
                rescuer_id:    row.get(2)?,
                org_id:        row.get(3)?,
                rescued_at:    row.get(4)?,
              },
              animal:     RawAnimal::from_row_at(row, 5)?,
              org_json:   row.get(17)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOrgRescue::into_org_rescue).collect()
  }

  // ── Rescue reports ────────────────────────────────────────────────────────

  async fn file_report(&self, input: NewReport) -> Result<RescueReport> {
    let report = RescueReport {
      report_id:          Uuid::new_v4(),
      animal_id:          input.animal_id,
      org_id:             input.org_id,
      description:        input.description,
      rescued_animal_pic: input.rescued_animal_pic,
      created_at:         Utc::now(),
    };

    let report_str  = encode_uuid(report.report_id);
    let animal_str  = encode_uuid(report.animal_id);
    let org_str     = encode_uuid(report.org_id);
    let description = report.description.clone();
    let picture     = report.rescued_animal_pic.clone();
    let at_str      = encode_dt(report.created_at);

    let filing = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let animal_exists = tx
          .query_row(
            "SELECT 1 FROM animals WHERE animal_id = ?1",
            rusqlite::params![animal_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !animal_exists {
          return Ok(Filing::MissingAnimal);
        }

        let rescued_by_org = tx
          .query_row(
            "SELECT 1 FROM rescue_assignments WHERE animal_id = ?1 AND org_id = ?2",
            rusqlite::params![animal_str, org_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !rescued_by_org {
          return Ok(Filing::NoRescue);
        }

        let inserted = tx.execute(
          "INSERT INTO rescue_reports (
             report_id, animal_id, org_id, description, rescued_animal_pic, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![report_str, animal_str, org_str, description, picture, at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(e) if unique_violation(&e).is_some() => return Ok(Filing::Duplicate),
          Err(e) => return Err(e.into()),
        }
        tx.commit()?;
        Ok(Filing::Done)
      })
      .await?;

    let animal_id = report.animal_id;
    match filing {
      Filing::Done => Ok(report),
      Filing::MissingAnimal => {
        Err(rescue_core::Error::not_found(Entity::Animal, animal_id).into())
      }
      Filing::NoRescue => Err(
        rescue_core::Error::NoRescueRecord { animal_id, org_id: report.org_id }.into(),
      ),
      Filing::Duplicate => Err(rescue_core::Error::ReportExists(animal_id).into()),
    }
  }

  async fn get_report(&self, animal_id: Uuid) -> Result<Option<RescueReport>> {
    let animal_str = encode_uuid(animal_id);

    let raw: Option<RawReport> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT report_id, animal_id, org_id, description, rescued_animal_pic, created_at
               FROM rescue_reports WHERE animal_id = ?1",
              rusqlite::params![animal_str],
              |row| {
                Ok(RawReport {
                  report_id:          row.get(0)?,
                  animal_id:          row.get(1)?,
                  org_id:             row.get(2)?,
                  description:        row.get(3)?,
                  rescued_animal_pic: row.get(4)?,
                  created_at:         row.get(5)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReport::into_report).transpose()
  }
}
