//! `RelationalStore` against Postgres, via `sqlx`.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use codegraph_domain::entities::{Document, DocumentChunk, DocumentLink, DriftAnalysis, DriftIssue, DriftSeverity, DriftStatus, LinkType, ProjectMetadata};
use codegraph_domain::ports::RelationalStore;
use codegraph_domain::value_objects::{ChunkId, DocumentId, LinkId};
use codegraph_domain::{Error, Result};

/// A `RelationalStore` backed by a Postgres connection pool.
pub struct PostgresStore {
    pool: PgPool,
}

fn pg_err(err: sqlx::Error) -> Error {
    Error::Postgres { message: err.to_string(), source: Some(Box::new(err)) }
}

impl PostgresStore {
    /// Connect to `connection_string` and create the documentation-pipeline
    /// tables if they do not already exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Postgres`] if the pool cannot be established or the
    /// schema cannot be created.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        Self::connect_with_max_connections(connection_string, None).await
    }

    /// Connect with an explicit pool size cap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Postgres`] if the pool cannot be established or the
    /// schema cannot be created.
    pub async fn connect_with_max_connections(connection_string: &str, max_connections: Option<u32>) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(max_connections.unwrap_or(10))
            .connect(connection_string)
            .await
            .map_err(pg_err)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS documents (
                id UUID PRIMARY KEY,
                project_name TEXT NOT NULL,
                file_path TEXT NOT NULL,
                title TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                UNIQUE (project_name, file_path)
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS document_chunks (
                id UUID PRIMARY KEY,
                document_id UUID NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
                project_name TEXT NOT NULL,
                content TEXT NOT NULL,
                heading_path TEXT[] NOT NULL,
                heading_level SMALLINT NOT NULL,
                start_line BIGINT NOT NULL,
                end_line BIGINT NOT NULL,
                content_hash TEXT NOT NULL,
                explicit_references TEXT[] NOT NULL,
                drift_status TEXT NOT NULL,
                drift_score DOUBLE PRECISION
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS document_links (
                id UUID PRIMARY KEY,
                chunk_id UUID NOT NULL REFERENCES document_chunks(id) ON DELETE CASCADE,
                entity_qn TEXT NOT NULL,
                entity_kind TEXT NOT NULL,
                file_path TEXT NOT NULL,
                link_type TEXT NOT NULL,
                confidence DOUBLE PRECISION NOT NULL,
                line_range_start BIGINT,
                line_range_end BIGINT,
                code_version_hash TEXT,
                reasoning TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS drift_analyses (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                chunk_id UUID NOT NULL,
                doc_path TEXT NOT NULL,
                entity_qn TEXT NOT NULL,
                trigger TEXT NOT NULL,
                drift_detected BOOLEAN NOT NULL,
                drift_severity TEXT NOT NULL,
                drift_score DOUBLE PRECISION NOT NULL,
                issues JSONB NOT NULL,
                explanation TEXT NOT NULL,
                doc_excerpt TEXT NOT NULL,
                code_excerpt TEXT NOT NULL,
                doc_version_hash TEXT NOT NULL,
                code_version_hash TEXT NOT NULL,
                analyzed_at TIMESTAMPTZ NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS project_metadata (
                project_name TEXT PRIMARY KEY,
                summary TEXT NOT NULL,
                triggered_by TEXT NOT NULL,
                generated_at TIMESTAMPTZ NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS metadata_generation_log (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                project_name TEXT NOT NULL,
                triggered_by TEXT NOT NULL,
                generated_at TIMESTAMPTZ NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;

        Ok(())
    }
}

fn drift_status_to_str(status: DriftStatus) -> &'static str {
    match status {
        DriftStatus::Aligned => "aligned",
        DriftStatus::MinorDrift => "minor_drift",
        DriftStatus::MajorDrift => "major_drift",
        DriftStatus::Unknown => "unknown",
    }
}

fn drift_status_from_str(value: &str) -> DriftStatus {
    match value {
        "aligned" => DriftStatus::Aligned,
        "minor_drift" => DriftStatus::MinorDrift,
        "major_drift" => DriftStatus::MajorDrift,
        _ => DriftStatus::Unknown,
    }
}

fn drift_severity_to_str(severity: DriftSeverity) -> &'static str {
    match severity {
        DriftSeverity::None => "none",
        DriftSeverity::Minor => "minor",
        DriftSeverity::Major => "major",
    }
}

fn drift_severity_from_str(value: &str) -> DriftSeverity {
    match value {
        "minor" => DriftSeverity::Minor,
        "major" => DriftSeverity::Major,
        _ => DriftSeverity::None,
    }
}

fn link_type_to_str(link_type: LinkType) -> &'static str {
    match link_type {
        LinkType::Explicit => "explicit",
        LinkType::Implicit => "implicit",
    }
}

fn link_type_from_str(value: &str) -> LinkType {
    match value {
        "implicit" => LinkType::Implicit,
        _ => LinkType::Explicit,
    }
}

fn row_to_chunk(row: &sqlx::postgres::PgRow) -> Result<DocumentChunk> {
    let id: uuid::Uuid = row.try_get("id").map_err(pg_err)?;
    let document_id: uuid::Uuid = row.try_get("document_id").map_err(pg_err)?;
    let drift_status: String = row.try_get("drift_status").map_err(pg_err)?;
    Ok(DocumentChunk {
        id: ChunkId::from(id),
        document_id: DocumentId::from(document_id),
        project_name: row.try_get("project_name").map_err(pg_err)?,
        content: row.try_get("content").map_err(pg_err)?,
        heading_path: row.try_get("heading_path").map_err(pg_err)?,
        heading_level: {
            let raw: i16 = row.try_get("heading_level").map_err(pg_err)?;
            raw as u8
        },
        start_line: {
            let raw: i64 = row.try_get("start_line").map_err(pg_err)?;
            raw as usize
        },
        end_line: {
            let raw: i64 = row.try_get("end_line").map_err(pg_err)?;
            raw as usize
        },
        content_hash: row.try_get("content_hash").map_err(pg_err)?,
        explicit_references: row.try_get("explicit_references").map_err(pg_err)?,
        drift_status: drift_status_from_str(&drift_status),
        drift_score: row.try_get("drift_score").map_err(pg_err)?,
    })
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<Document> {
    let id: uuid::Uuid = row.try_get("id").map_err(pg_err)?;
    let file_path: String = row.try_get("file_path").map_err(pg_err)?;
    Ok(Document {
        id: DocumentId::from(id),
        project_name: row.try_get("project_name").map_err(pg_err)?,
        file_path: std::path::PathBuf::from(file_path),
        title: row.try_get("title").map_err(pg_err)?,
        content_hash: row.try_get("content_hash").map_err(pg_err)?,
    })
}

fn row_to_link(row: &sqlx::postgres::PgRow) -> Result<DocumentLink> {
    let id: uuid::Uuid = row.try_get("id").map_err(pg_err)?;
    let chunk_id: uuid::Uuid = row.try_get("chunk_id").map_err(pg_err)?;
    let link_type: String = row.try_get("link_type").map_err(pg_err)?;
    let file_path: String = row.try_get("file_path").map_err(pg_err)?;
    Ok(DocumentLink {
        id: LinkId::from(id),
        chunk_id: ChunkId::from(chunk_id),
        entity_qn: row.try_get("entity_qn").map_err(pg_err)?,
        entity_kind: row.try_get("entity_kind").map_err(pg_err)?,
        file_path: std::path::PathBuf::from(file_path),
        link_type: link_type_from_str(&link_type),
        confidence: row.try_get("confidence").map_err(pg_err)?,
        line_range_start: {
            let raw: Option<i64> = row.try_get("line_range_start").map_err(pg_err)?;
            raw.map(|v| v as usize)
        },
        line_range_end: {
            let raw: Option<i64> = row.try_get("line_range_end").map_err(pg_err)?;
            raw.map(|v| v as usize)
        },
        code_version_hash: row.try_get("code_version_hash").map_err(pg_err)?,
        reasoning: row.try_get("reasoning").map_err(pg_err)?,
    })
}

fn row_to_drift_analysis(row: &sqlx::postgres::PgRow) -> Result<DriftAnalysis> {
    let chunk_id: uuid::Uuid = row.try_get("chunk_id").map_err(pg_err)?;
    let severity: String = row.try_get("drift_severity").map_err(pg_err)?;
    let issues_json: serde_json::Value = row.try_get("issues").map_err(pg_err)?;
    let issues: Vec<DriftIssue> = serde_json::from_value(issues_json).map_err(Error::Json)?;
    Ok(DriftAnalysis {
        chunk_id: ChunkId::from(chunk_id),
        doc_path: row.try_get("doc_path").map_err(pg_err)?,
        entity_qn: row.try_get("entity_qn").map_err(pg_err)?,
        trigger: row.try_get("trigger").map_err(pg_err)?,
        drift_detected: row.try_get("drift_detected").map_err(pg_err)?,
        drift_severity: drift_severity_from_str(&severity),
        drift_score: row.try_get("drift_score").map_err(pg_err)?,
        issues,
        explanation: row.try_get("explanation").map_err(pg_err)?,
        doc_excerpt: row.try_get("doc_excerpt").map_err(pg_err)?,
        code_excerpt: row.try_get("code_excerpt").map_err(pg_err)?,
        doc_version_hash: row.try_get("doc_version_hash").map_err(pg_err)?,
        code_version_hash: row.try_get("code_version_hash").map_err(pg_err)?,
        analyzed_at: row.try_get("analyzed_at").map_err(pg_err)?,
    })
}

#[async_trait]
impl RelationalStore for PostgresStore {
    async fn upsert_document(&self, document: &Document) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO documents (id, project_name, file_path, title, content_hash)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (project_name, file_path) DO UPDATE SET
                title = excluded.title,
                content_hash = excluded.content_hash
            ",
        )
        .bind(document.id.inner())
        .bind(&document.project_name)
        .bind(document.file_path.to_string_lossy().into_owned())
        .bind(&document.title)
        .bind(&document.content_hash)
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(())
    }

    async fn documents_for_project(&self, project_name: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query("SELECT id, project_name, file_path, title, content_hash FROM documents WHERE project_name = $1 ORDER BY file_path")
            .bind(project_name)
            .fetch_all(&self.pool)
            .await
            .map_err(pg_err)?;
        rows.iter().map(row_to_document).collect()
    }

    async fn document_by_path(&self, project_name: &str, file_path: &str) -> Result<Option<Document>> {
        let row = sqlx::query("SELECT id, project_name, file_path, title, content_hash FROM documents WHERE project_name = $1 AND file_path = $2")
            .bind(project_name)
            .bind(file_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(pg_err)?;
        row.as_ref().map(row_to_document).transpose()
    }

    async fn delete_chunks_for_document(&self, document_id: DocumentId) -> Result<()> {
        sqlx::query("DELETE FROM document_chunks WHERE document_id = $1").bind(document_id.inner()).execute(&self.pool).await.map_err(pg_err)?;
        Ok(())
    }

    async fn insert_chunks(&self, chunks: &[DocumentChunk]) -> Result<()> {
        for chunk in chunks {
            sqlx::query(
                r"
                INSERT INTO document_chunks
                    (id, document_id, project_name, content, heading_path, heading_level,
                     start_line, end_line, content_hash, explicit_references, drift_status, drift_score)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                ",
            )
            .bind(chunk.id.inner())
            .bind(chunk.document_id.inner())
            .bind(&chunk.project_name)
            .bind(&chunk.content)
            .bind(&chunk.heading_path)
            .bind(i16::from(chunk.heading_level))
            .bind(chunk.start_line as i64)
            .bind(chunk.end_line as i64)
            .bind(&chunk.content_hash)
            .bind(&chunk.explicit_references)
            .bind(drift_status_to_str(chunk.drift_status))
            .bind(chunk.drift_score)
            .execute(&self.pool)
            .await
            .map_err(pg_err)?;
        }
        Ok(())
    }

    async fn chunks_for_document(&self, document_id: DocumentId) -> Result<Vec<DocumentChunk>> {
        let rows = sqlx::query("SELECT * FROM document_chunks WHERE document_id = $1").bind(document_id.inner()).fetch_all(&self.pool).await.map_err(pg_err)?;
        rows.iter().map(row_to_chunk).collect()
    }

    async fn update_chunk_drift(&self, chunk_id: ChunkId, status: DriftStatus, score: Option<f64>) -> Result<()> {
        sqlx::query("UPDATE document_chunks SET drift_status = $1, drift_score = $2 WHERE id = $3")
            .bind(drift_status_to_str(status))
            .bind(score)
            .bind(chunk_id.inner())
            .execute(&self.pool)
            .await
            .map_err(pg_err)?;
        Ok(())
    }

    async fn replace_links(&self, chunk_id: ChunkId, links: &[DocumentLink]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(pg_err)?;

        sqlx::query("DELETE FROM document_links WHERE chunk_id = $1").bind(chunk_id.inner()).execute(&mut *tx).await.map_err(pg_err)?;

        for link in links {
            sqlx::query(
                r"
                INSERT INTO document_links
                    (id, chunk_id, entity_qn, entity_kind, file_path, link_type, confidence,
                     line_range_start, line_range_end, code_version_hash, reasoning)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ",
            )
            .bind(link.id.inner())
            .bind(chunk_id.inner())
            .bind(&link.entity_qn)
            .bind(&link.entity_kind)
            .bind(link.file_path.to_string_lossy().into_owned())
            .bind(link_type_to_str(link.link_type))
            .bind(link.confidence)
            .bind(link.line_range_start.map(|v| v as i64))
            .bind(link.line_range_end.map(|v| v as i64))
            .bind(&link.code_version_hash)
            .bind(&link.reasoning)
            .execute(&mut *tx)
            .await
            .map_err(pg_err)?;
        }

        tx.commit().await.map_err(pg_err)?;
        Ok(())
    }

    async fn links_for_chunk(&self, chunk_id: ChunkId) -> Result<Vec<DocumentLink>> {
        let rows = sqlx::query("SELECT * FROM document_links WHERE chunk_id = $1").bind(chunk_id.inner()).fetch_all(&self.pool).await.map_err(pg_err)?;
        rows.iter().map(row_to_link).collect()
    }

    async fn insert_drift_analysis(&self, analysis: &DriftAnalysis) -> Result<()> {
        let issues_json = serde_json::to_value(&analysis.issues).map_err(Error::Json)?;
        sqlx::query(
            r"
            INSERT INTO drift_analyses
                (chunk_id, doc_path, entity_qn, trigger, drift_detected, drift_severity, drift_score,
                 issues, explanation, doc_excerpt, code_excerpt, doc_version_hash, code_version_hash, analyzed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(analysis.chunk_id.inner())
        .bind(&analysis.doc_path)
        .bind(&analysis.entity_qn)
        .bind(&analysis.trigger)
        .bind(analysis.drift_detected)
        .bind(drift_severity_to_str(analysis.drift_severity))
        .bind(analysis.drift_score)
        .bind(issues_json)
        .bind(&analysis.explanation)
        .bind(&analysis.doc_excerpt)
        .bind(&analysis.code_excerpt)
        .bind(&analysis.doc_version_hash)
        .bind(&analysis.code_version_hash)
        .bind(analysis.analyzed_at)
        .execute(&self.pool)
        .await
        .map_err(pg_err)?;
        Ok(())
    }

    async fn latest_drift_for_entity(&self, chunk_id: ChunkId, entity_qn: &str) -> Result<Option<DriftAnalysis>> {
        let row = sqlx::query(
            r"
            SELECT * FROM drift_analyses
            WHERE chunk_id = $1 AND entity_qn = $2
            ORDER BY drift_score DESC
            LIMIT 1
            ",
        )
        .bind(chunk_id.inner())
        .bind(entity_qn)
        .fetch_optional(&self.pool)
        .await
        .map_err(pg_err)?;

        row.as_ref().map(row_to_drift_analysis).transpose()
    }

    async fn upsert_project_metadata(&self, metadata: &ProjectMetadata) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(pg_err)?;

        sqlx::query(
            r"
            INSERT INTO project_metadata (project_name, summary, triggered_by, generated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (project_name) DO UPDATE SET
                summary = excluded.summary,
                triggered_by = excluded.triggered_by,
                generated_at = excluded.generated_at
            ",
        )
        .bind(&metadata.project_name)
        .bind(&metadata.summary)
        .bind(&metadata.triggered_by)
        .bind(metadata.generated_at)
        .execute(&mut *tx)
        .await
        .map_err(pg_err)?;

        sqlx::query("INSERT INTO metadata_generation_log (project_name, triggered_by, generated_at) VALUES ($1, $2, $3)")
            .bind(&metadata.project_name)
            .bind(&metadata.triggered_by)
            .bind(metadata.generated_at)
            .execute(&mut *tx)
            .await
            .map_err(pg_err)?;

        tx.commit().await.map_err(pg_err)?;
        Ok(())
    }

    async fn latest_project_metadata(&self, project_name: &str) -> Result<Option<ProjectMetadata>> {
        let row = sqlx::query("SELECT * FROM project_metadata WHERE project_name = $1").bind(project_name).fetch_optional(&self.pool).await.map_err(pg_err)?;

        row.map(|row| {
            Ok(ProjectMetadata {
                project_name: row.try_get("project_name").map_err(pg_err)?,
                summary: row.try_get("summary").map_err(pg_err)?,
                triggered_by: row.try_get("triggered_by").map_err(pg_err)?,
                generated_at: row.try_get("generated_at").map_err(pg_err)?,
            })
        })
        .transpose()
    }

    async fn delete_project_data(&self, project_name: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(pg_err)?;

        sqlx::query(
            r"
            DELETE FROM document_links WHERE chunk_id IN (
                SELECT dc.id FROM document_chunks dc
                JOIN documents d ON d.id = dc.document_id
                WHERE d.project_name = $1
            )
            ",
        )
        .bind(project_name)
        .execute(&mut *tx)
        .await
        .map_err(pg_err)?;

        sqlx::query("DELETE FROM document_chunks WHERE project_name = $1").bind(project_name).execute(&mut *tx).await.map_err(pg_err)?;
        sqlx::query("DELETE FROM documents WHERE project_name = $1").bind(project_name).execute(&mut *tx).await.map_err(pg_err)?;
        sqlx::query("DELETE FROM project_metadata WHERE project_name = $1").bind(project_name).execute(&mut *tx).await.map_err(pg_err)?;
        sqlx::query("DELETE FROM metadata_generation_log WHERE project_name = $1").bind(project_name).execute(&mut *tx).await.map_err(pg_err)?;

        tx.commit().await.map_err(pg_err)?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(pg_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drift_status_round_trips_through_its_string_encoding() {
        for status in [DriftStatus::Aligned, DriftStatus::MinorDrift, DriftStatus::MajorDrift, DriftStatus::Unknown] {
            assert_eq!(drift_status_from_str(drift_status_to_str(status)), status);
        }
    }

    #[test]
    fn link_type_round_trips_through_its_string_encoding() {
        for link_type in [LinkType::Explicit, LinkType::Implicit] {
            assert_eq!(link_type_from_str(link_type_to_str(link_type)), link_type);
        }
    }
}
