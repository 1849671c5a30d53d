//! Enrolled-people roster service: search and bulk import

use indexmap::{map::Entry, IndexMap};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::RosterConfig,
    error::{AppError, AppResult},
    import::{self, ImportFormat},
    models::{
        enrollee::{
            EnrolledPerson, NewEnrolledPerson, RosterQuery, RosterSearchResponse,
            UpdateEnrolledPerson,
        },
        import_report::{ImportPreview, ImportResult, ParsedImport, PreviewRow},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RosterService {
    repository: Repository,
    config: RosterConfig,
}

impl RosterService {
    pub fn new(repository: Repository, config: RosterConfig) -> Self {
        Self { repository, config }
    }

    /// Search by name, tax ID or enrollment number; the request sequence is
    /// echoed back untouched
    pub async fn search(&self, query: &RosterQuery) -> AppResult<RosterSearchResponse> {
        let term = query.q.as_deref().unwrap_or_default();
        let limit = query
            .limit
            .unwrap_or(self.config.search_limit)
            .clamp(1, self.config.search_limit);

        let people = self.repository.roster.search(term, limit).await?;
        tracing::debug!("Roster search {:?} returned {} people", term, people.len());

        Ok(RosterSearchResponse {
            seq: query.seq,
            people,
        })
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<EnrolledPerson> {
        self.repository.roster.get_by_id(id).await
    }

    pub async fn create(&self, data: NewEnrolledPerson) -> AppResult<EnrolledPerson> {
        let data = data.normalized();
        data.validate()?;
        let person = self.repository.roster.create(&data).await?;
        tracing::info!("Enrolled person {} created", person.id);
        Ok(person)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateEnrolledPerson) -> AppResult<EnrolledPerson> {
        data.validate()?;
        self.repository.roster.update(id, data).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.roster.delete(id).await?;
        tracing::info!("Enrolled person {} deleted", id);
        Ok(())
    }

    /// Parse an uploaded file and build the confirmation preview
    pub async fn preview_file(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> AppResult<ImportPreview> {
        let format = ImportFormat::detect(file_name, content_type).ok_or_else(|| {
            AppError::BadRequest("Unsupported file type, expected .csv or .xlsx".to_string())
        })?;
        let parsed = import::parse(format, bytes)?;
        self.preview(parsed).await
    }

    /// Collapse repeated tax IDs to their first row and flag the ones already
    /// on the roster; duplicates start deselected
    pub async fn preview(&self, parsed: ParsedImport) -> AppResult<ImportPreview> {
        let mut unique = IndexMap::new();
        let mut collapsed = 0;
        for row in parsed.rows {
            match unique.entry(row.record.tax_id.clone()) {
                Entry::Occupied(_) => collapsed += 1,
                Entry::Vacant(slot) => {
                    slot.insert(row);
                }
            }
        }

        let tax_ids: Vec<String> = unique.keys().cloned().collect();
        let existing = self.repository.roster.existing_tax_ids(&tax_ids).await?;

        let rows: Vec<PreviewRow> = unique
            .into_values()
            .map(|row| {
                let duplicate = existing.contains(&row.record.tax_id);
                PreviewRow {
                    line: row.line,
                    record: row.record,
                    duplicate,
                    selected: !duplicate,
                }
            })
            .collect();

        tracing::info!(
            "Import preview: {} candidates, {} already enrolled, {} collapsed, {} skipped",
            rows.len(),
            rows.iter().filter(|r| r.duplicate).count(),
            collapsed,
            parsed.skipped.len()
        );

        Ok(ImportPreview {
            rows,
            skipped: parsed.skipped,
            collapsed,
        })
    }

    /// Insert the confirmed records; tax IDs already enrolled are skipped
    pub async fn import(&self, records: Vec<NewEnrolledPerson>) -> AppResult<ImportResult> {
        let mut unique: IndexMap<String, NewEnrolledPerson> = IndexMap::new();
        for record in records {
            let record = record.normalized();
            record.validate()?;
            unique.entry(record.tax_id.clone()).or_insert(record);
        }
        let records: Vec<NewEnrolledPerson> = unique.into_values().collect();

        let inserted = self.repository.roster.insert_many(&records).await?;
        let result = ImportResult {
            inserted,
            skipped_existing: records.len() - inserted,
        };
        tracing::info!(
            "Roster import: {} inserted, {} skipped",
            result.inserted,
            result.skipped_existing
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::import_report::ImportRow;

    fn record(name: &str, tax_id: &str) -> NewEnrolledPerson {
        NewEnrolledPerson {
            name: name.to_string(),
            tax_id: tax_id.to_string(),
            email: None,
            phone: None,
            enrollment_number: None,
        }
    }

    fn service() -> (RosterService, Repository) {
        let repo = Repository::in_memory();
        (
            RosterService::new(repo.clone(), RosterConfig { search_limit: 50 }),
            repo,
        )
    }

    #[tokio::test]
    async fn test_preview_flags_existing_and_import_inserts_the_rest() {
        let (service, _) = service();
        service.create(record("Existing", "333")).await.unwrap();

        let parsed = ParsedImport {
            rows: vec![
                ImportRow { line: 1, record: record("Ana", "111") },
                ImportRow { line: 2, record: record("Bruno", "222") },
                ImportRow { line: 3, record: record("Existing again", "333") },
            ],
            skipped: vec![],
        };
        let preview = service.preview(parsed).await.unwrap();
        assert_eq!(preview.rows.len(), 3);
        let dup = preview.rows.iter().find(|r| r.record.tax_id == "333").unwrap();
        assert!(dup.duplicate);
        assert!(!dup.selected);
        assert_eq!(preview.rows.iter().filter(|r| r.selected).count(), 2);

        let selected = preview
            .rows
            .into_iter()
            .filter(|r| r.selected)
            .map(|r| r.record)
            .collect();
        let result = service.import(selected).await.unwrap();
        assert_eq!(result, ImportResult { inserted: 2, skipped_existing: 0 });

        let all = service.search(&RosterQuery::default()).await.unwrap();
        assert_eq!(all.people.len(), 3);
    }

    #[tokio::test]
    async fn test_in_batch_duplicates_keep_first_occurrence() {
        let (service, _) = service();
        let parsed = ParsedImport {
            rows: vec![
                ImportRow { line: 1, record: record("First", "111") },
                ImportRow { line: 2, record: record("Second", "111") },
            ],
            skipped: vec![],
        };
        let preview = service.preview(parsed).await.unwrap();
        assert_eq!(preview.rows.len(), 1);
        assert_eq!(preview.rows[0].record.name, "First");
        assert_eq!(preview.collapsed, 1);
    }

    #[tokio::test]
    async fn test_import_skips_tax_ids_already_enrolled() {
        let (service, _) = service();
        service.create(record("Ana", "111")).await.unwrap();
        let result = service
            .import(vec![record("Ana bis", "111.")])
            .await
            .unwrap();
        assert_eq!(result, ImportResult { inserted: 0, skipped_existing: 1 });
    }

    #[tokio::test]
    async fn test_search_echoes_sequence_and_clamps_limit() {
        let (service, _) = service();
        for i in 0..3 {
            service.create(record(&format!("Pessoa {}", i), &format!("{}", 900 + i))).await.unwrap();
        }
        let response = service
            .search(&RosterQuery {
                q: Some("pessoa".to_string()),
                limit: Some(2),
                seq: Some(17),
            })
            .await
            .unwrap();
        assert_eq!(response.seq, Some(17));
        assert_eq!(response.people.len(), 2);
    }

    #[tokio::test]
    async fn test_preview_from_csv_file() {
        let (service, _) = service();
        let csv = "nome,cpf,email,telefone\nAna,111.111.111-11,ana@example.org,1\nBruno,222,,\n";
        let preview = service
            .preview_file(Some("lista.csv"), None, csv.as_bytes())
            .await
            .unwrap();
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[0].record.tax_id, "11111111111");
        assert_eq!(preview.rows[1].record.email, None);
    }

    #[tokio::test]
    async fn test_unsupported_upload_type() {
        let (service, _) = service();
        let err = service
            .preview_file(Some("lista.pdf"), Some("application/pdf"), b"%PDF")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
