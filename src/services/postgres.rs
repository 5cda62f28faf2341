use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{
    GeoPoint, ImageRef, LostDogPosting, MatchNotification, MatchRecord, PetPair, PetProfile,
    PhotoAnalysis, PostingStatus, SizeClass, StrayDogReport, SwipeAction, VideoAnalysis,
};
use crate::services::store::{
    LostPostingStore, NotificationSink, PetStore, StoreError, StrayReportStore, SwipeStore,
};

/// PostgreSQL-backed implementation of every persistence port
///
/// Matches rely on the `UNIQUE (pet_low, pet_high)` index so concurrent
/// mutual likes cannot create two records for the same pair.
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Create a new PostgreSQL client from a connection string
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout_secs: u64,
        idle_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(idle_timeout_secs))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new PostgreSQL client from settings
    pub async fn from_settings(settings: &crate::config::DatabaseSettings) -> Result<Self, StoreError> {
        tracing::info!(
            "Connecting to PostgreSQL (max {} connections)",
            settings.max_connections
        );

        Self::new(
            &settings.url,
            settings.max_connections,
            settings.min_connections,
            settings.acquire_timeout_secs,
            settings.idle_timeout_secs,
        )
        .await
    }
}

fn location_from_row(row: &PgRow) -> Result<Option<GeoPoint>, StoreError> {
    let latitude: Option<f64> = row.try_get("latitude")?;
    let longitude: Option<f64> = row.try_get("longitude")?;
    Ok(match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
        _ => None,
    })
}

fn pet_from_row(row: &PgRow) -> Result<PetProfile, StoreError> {
    let size: String = row.try_get("size")?;
    let age_months: i32 = row.try_get("age_months")?;
    let ai_tags: Option<Json<PhotoAnalysis>> = row.try_get("ai_tags")?;

    Ok(PetProfile {
        pet_id: row.try_get("pet_id")?,
        owner_id: row.try_get("owner_id")?,
        name: row.try_get("name")?,
        size: SizeClass::parse_lenient(&size),
        age_months: u16::try_from(age_months.max(0)).unwrap_or(u16::MAX),
        vaccinated: row.try_get("vaccinated")?,
        neutered: row.try_get("neutered")?,
        sociability: row.try_get("sociability")?,
        playfulness: row.try_get("playfulness")?,
        emotional_stability: row.try_get("emotional_stability")?,
        activity_level: row.try_get("activity_level")?,
        ai_tags: ai_tags.map(|Json(tags)| tags),
        created_at: row.try_get("created_at")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<MatchRecord, StoreError> {
    let match_id: Uuid = row.try_get("match_id")?;
    Ok(MatchRecord {
        match_id: match_id.to_string(),
        pet1_id: row.try_get("pet_low")?,
        pet2_id: row.try_get("pet_high")?,
        created_at: row.try_get("created_at")?,
    })
}

fn report_from_row(row: &PgRow) -> Result<StrayDogReport, StoreError> {
    let image_path: Option<String> = row.try_get("image_path")?;
    let image_bytes: Option<Vec<u8>> = row.try_get("image_bytes")?;
    let report_id: String = row.try_get("report_id")?;

    let image = match (image_path, image_bytes) {
        (Some(path), _) => ImageRef::Path(path),
        (None, Some(bytes)) => ImageRef::Inline(bytes),
        (None, None) => {
            return Err(StoreError::InvalidInput(format!(
                "stray report {} has no image",
                report_id
            )))
        }
    };

    Ok(StrayDogReport {
        report_id,
        image,
        reported_at: row.try_get("reported_at")?,
        location: location_from_row(row)?,
    })
}

fn notification_from_row(row: &PgRow) -> Result<MatchNotification, StoreError> {
    let Json(matched_report_ids): Json<Vec<String>> = row.try_get("matched_report_ids")?;
    Ok(MatchNotification {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        matched_report_ids,
        similarity_score: row.try_get("similarity_score")?,
        created_at: row.try_get("created_at")?,
    })
}

fn posting_from_row(row: &PgRow) -> Result<LostDogPosting, StoreError> {
    let status: String = row.try_get("status")?;
    let id: Uuid = row.try_get("id")?;
    Ok(LostDogPosting {
        id: id.to_string(),
        breed: row.try_get("breed")?,
        description: row.try_get("description")?,
        lost_at: row.try_get("lost_at")?,
        location: location_from_row(row)?,
        address: row.try_get("address")?,
        contact: row.try_get("contact")?,
        photo_path: row.try_get("photo_path")?,
        status: PostingStatus::parse(&status).unwrap_or(PostingStatus::Pending),
        created_at: row.try_get("created_at")?,
    })
}

const PET_COLUMNS: &str = r#"
    pet_id, owner_id, name, size, age_months, vaccinated, neutered,
    sociability, playfulness, emotional_stability, activity_level, ai_tags, created_at
"#;

#[async_trait]
impl PetStore for PostgresClient {
    async fn get_pet(&self, pet_id: &str) -> Result<Option<PetProfile>, StoreError> {
        let query = format!("SELECT {} FROM pets WHERE pet_id = $1", PET_COLUMNS);

        let row = sqlx::query(&query)
            .bind(pet_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(pet_from_row).transpose()
    }

    async fn create_pet(&self, pet: &PetProfile) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO pets (
                pet_id, owner_id, name, size, age_months, vaccinated, neutered,
                sociability, playfulness, emotional_stability, activity_level, ai_tags, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, COALESCE($13, NOW()))
            ON CONFLICT (pet_id) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(&pet.pet_id)
            .bind(&pet.owner_id)
            .bind(&pet.name)
            .bind(pet.size.as_str())
            .bind(i32::from(pet.age_months))
            .bind(pet.vaccinated)
            .bind(pet.neutered)
            .bind(pet.sociability)
            .bind(pet.playfulness)
            .bind(pet.emotional_stability)
            .bind(pet.activity_level)
            .bind(pet.ai_tags.as_ref().map(Json))
            .bind(pet.created_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!("pet {} already exists", pet.pet_id)));
        }

        tracing::debug!("Created pet {} for owner {}", pet.pet_id, pet.owner_id);
        Ok(())
    }

    async fn list_candidates(
        &self,
        exclude_ids: &[String],
        exclude_owner: &str,
    ) -> Result<Vec<PetProfile>, StoreError> {
        let query = format!(
            "SELECT {} FROM pets WHERE owner_id <> $1 AND NOT (pet_id = ANY($2)) ORDER BY created_at, pet_id",
            PET_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(exclude_owner)
            .bind(exclude_ids)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(pet_from_row).collect()
    }

    async fn update_ai_tags(&self, pet_id: &str, tags: &PhotoAnalysis) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE pets SET ai_tags = $2 WHERE pet_id = $1")
            .bind(pet_id)
            .bind(Json(tags))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("pet {}", pet_id)));
        }
        Ok(())
    }

    async fn append_dynamic_info(
        &self,
        pet_id: &str,
        video_path: &str,
        analysis: &VideoAnalysis,
    ) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO pet_dynamic_info (
                pet_id, video_path, activity_level, approach_speed,
                emotional_stability, play_preference, body_language_score, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
        "#;

        sqlx::query(query)
            .bind(pet_id)
            .bind(video_path)
            .bind(analysis.activity_level)
            .bind(analysis.approach_speed)
            .bind(analysis.emotional_stability)
            .bind(analysis.play_preference.as_str())
            .bind(analysis.body_language_score)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl SwipeStore for PostgresClient {
    async fn append_swipe(&self, swipe: &SwipeAction) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO swipes (actor_pet_id, actor_owner_id, target_pet_id, decision, created_at)
            VALUES ($1, $2, $3, $4, $5)
        "#;

        sqlx::query(query)
            .bind(&swipe.actor_pet_id)
            .bind(&swipe.actor_owner_id)
            .bind(&swipe.target_pet_id)
            .bind(swipe.decision.as_str())
            .bind(swipe.created_at)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            "Recorded swipe: {} -> {} ({})",
            swipe.actor_pet_id,
            swipe.target_pet_id,
            swipe.decision.as_str()
        );

        Ok(())
    }

    async fn has_like(
        &self,
        actor_owner_id: &str,
        target_pet_id: &str,
    ) -> Result<bool, StoreError> {
        let query = r#"
            SELECT EXISTS (
                SELECT 1 FROM swipes
                WHERE actor_owner_id = $1 AND target_pet_id = $2 AND decision = 'like'
            ) AS liked
        "#;

        let row = sqlx::query(query)
            .bind(actor_owner_id)
            .bind(target_pet_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get("liked")?)
    }

    async fn swiped_target_ids(&self, actor_pet_id: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT DISTINCT target_pet_id FROM swipes WHERE actor_pet_id = $1")
            .bind(actor_pet_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("target_pet_id").map_err(StoreError::from))
            .collect()
    }

    async fn create_match_if_absent(
        &self,
        pair: &PetPair,
    ) -> Result<Option<MatchRecord>, StoreError> {
        let query = r#"
            INSERT INTO pet_matches (match_id, pet_low, pet_high, created_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (pet_low, pet_high) DO NOTHING
            RETURNING match_id, pet_low, pet_high, created_at
        "#;

        let row = sqlx::query(query)
            .bind(Uuid::new_v4())
            .bind(pair.low())
            .bind(pair.high())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn list_matches(&self, pet_id: &str) -> Result<Vec<MatchRecord>, StoreError> {
        let query = r#"
            SELECT match_id, pet_low, pet_high, created_at
            FROM pet_matches
            WHERE pet_low = $1 OR pet_high = $1
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query).bind(pet_id).fetch_all(&self.pool).await?;
        rows.iter().map(match_from_row).collect()
    }
}

#[async_trait]
impl StrayReportStore for PostgresClient {
    async fn upsert_report(&self, report: &StrayDogReport) -> Result<(), StoreError> {
        let (image_path, image_bytes) = match &report.image {
            ImageRef::Path(path) => (Some(path.as_str()), None),
            ImageRef::Inline(bytes) => (None, Some(bytes.as_slice())),
        };

        let query = r#"
            INSERT INTO stray_dog_reports (
                report_id, image_path, image_bytes, reported_at, latitude, longitude, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (report_id)
            DO UPDATE SET
                image_path = EXCLUDED.image_path,
                image_bytes = EXCLUDED.image_bytes,
                reported_at = EXCLUDED.reported_at,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                updated_at = EXCLUDED.updated_at
        "#;

        sqlx::query(query)
            .bind(&report.report_id)
            .bind(image_path)
            .bind(image_bytes)
            .bind(report.reported_at)
            .bind(report.location.map(|l| l.latitude))
            .bind(report.location.map(|l| l.longitude))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_reports(&self) -> Result<Vec<StrayDogReport>, StoreError> {
        let query = r#"
            SELECT report_id, image_path, image_bytes, reported_at, latitude, longitude
            FROM stray_dog_reports
            ORDER BY updated_at DESC
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        rows.iter().map(report_from_row).collect()
    }
}

#[async_trait]
impl NotificationSink for PostgresClient {
    async fn notify_possible_match(
        &self,
        owner_id: &str,
        matched_report_ids: &[String],
        similarity_score: f64,
    ) -> Result<MatchNotification, StoreError> {
        let query = r#"
            INSERT INTO match_notifications (owner_id, matched_report_ids, similarity_score, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, owner_id, matched_report_ids, similarity_score, created_at
        "#;

        let row = sqlx::query(query)
            .bind(owner_id)
            .bind(Json(matched_report_ids))
            .bind(similarity_score)
            .fetch_one(&self.pool)
            .await?;

        notification_from_row(&row)
    }

    async fn list_notifications(
        &self,
        owner_id: Option<&str>,
    ) -> Result<Vec<MatchNotification>, StoreError> {
        let query = r#"
            SELECT id, owner_id, matched_report_ids, similarity_score, created_at
            FROM match_notifications
            WHERE $1::TEXT IS NULL OR owner_id = $1
            ORDER BY created_at DESC, id DESC
        "#;

        let rows = sqlx::query(query).bind(owner_id).fetch_all(&self.pool).await?;
        rows.iter().map(notification_from_row).collect()
    }
}

#[async_trait]
impl LostPostingStore for PostgresClient {
    async fn create_posting(&self, posting: &LostDogPosting) -> Result<(), StoreError> {
        let id = Uuid::parse_str(&posting.id)
            .map_err(|e| StoreError::InvalidInput(format!("posting id: {}", e)))?;

        let query = r#"
            INSERT INTO lost_dog_postings (
                id, breed, description, lost_at, latitude, longitude,
                address, contact, photo_path, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#;

        sqlx::query(query)
            .bind(id)
            .bind(&posting.breed)
            .bind(&posting.description)
            .bind(posting.lost_at)
            .bind(posting.location.map(|l| l.latitude))
            .bind(posting.location.map(|l| l.longitude))
            .bind(&posting.address)
            .bind(&posting.contact)
            .bind(&posting.photo_path)
            .bind(posting.status.as_str())
            .bind(posting.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_postings(&self) -> Result<Vec<LostDogPosting>, StoreError> {
        let query = r#"
            SELECT id, breed, description, lost_at, latitude, longitude,
                   address, contact, photo_path, status, created_at
            FROM lost_dog_postings
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;
        rows.iter().map(posting_from_row).collect()
    }

    async fn update_status(
        &self,
        posting_id: &str,
        status: PostingStatus,
    ) -> Result<Option<LostDogPosting>, StoreError> {
        let Ok(id) = Uuid::parse_str(posting_id) else {
            return Ok(None);
        };

        let query = r#"
            UPDATE lost_dog_postings SET status = $2
            WHERE id = $1
            RETURNING id, breed, description, lost_at, latitude, longitude,
                      address, contact, photo_path, status, created_at
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(posting_from_row).transpose()
    }
}

