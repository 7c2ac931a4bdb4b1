use std::future::Future;

use sqlx::QueryBuilder;

use crate::entities::{CaseRecord, SqliteStore};

const CASE_COLUMNS: &str = "id, customer, product_model, lot_id, cell_id, defect_type, \
     defect_description, root_cause, analysis_result, corrective_action, tags, \
     reported_at, created_at";

/// Filters for the plain case listing.  Every field is optional; an empty
/// query returns the most recent cases up to `limit`.
#[derive(Debug, Clone)]
pub struct CaseQuery {
    /// Substring match on the customer name.
    pub customer: Option<String>,
    /// Substring match on the product model.
    pub product_model: Option<String>,
    /// Exact match on the defect type.
    pub defect_type: Option<String>,
    /// Free-text term matched against description, root cause, analysis
    /// result, corrective action and tags.
    pub search: Option<String>,
    pub limit: i64,
}

impl Default for CaseQuery {
    fn default() -> Self {
        Self {
            customer: None,
            product_model: None,
            defect_type: None,
            search: None,
            limit: 10,
        }
    }
}

/// Terms for the similar-case lookup.  Each populated field contributes one
/// condition group; `match_all_terms` requires every group, `match_any_term`
/// any one of them.
#[derive(Debug, Clone, Default)]
pub struct SimilarityTerms {
    /// Whole-value match on the customer name, case-insensitive.
    pub customer: Option<String>,
    /// Substring match on the product model.
    pub product_model: Option<String>,
    /// Exact match on the defect type.
    pub defect_type: Option<String>,
    /// Each keyword is a substring match against description, root cause,
    /// analysis result and tags.
    pub keywords: Vec<String>,
}

impl SimilarityTerms {
    /// True when no field would contribute a condition.
    pub fn is_empty(&self) -> bool {
        self.customer.is_none()
            && self.product_model.is_none()
            && self.defect_type.is_none()
            && self.keywords.is_empty()
    }
}

/// Appends one condition group per populated term, separated by `joiner`
/// (`" AND "` or `" OR "`).  The caller has already pushed `" WHERE "`.
fn push_term_groups(
    builder: &mut QueryBuilder<'_, sqlx::Sqlite>,
    terms: &SimilarityTerms,
    joiner: &str,
) {
    let mut sep = "";
    if let Some(customer) = &terms.customer {
        builder
            .push(sep)
            .push("customer = ")
            .push_bind(customer.clone())
            .push(" COLLATE NOCASE");
        sep = joiner;
    }
    if let Some(model) = &terms.product_model {
        builder
            .push(sep)
            .push("product_model LIKE ")
            .push_bind(format!("%{model}%"));
        sep = joiner;
    }
    if let Some(defect) = &terms.defect_type {
        builder
            .push(sep)
            .push("defect_type = ")
            .push_bind(defect.clone());
        sep = joiner;
    }
    for keyword in &terms.keywords {
        let pattern = format!("%{keyword}%");
        builder
            .push(sep)
            .push("(defect_description LIKE ")
            .push_bind(pattern.clone())
            .push(" OR root_cause LIKE ")
            .push_bind(pattern.clone())
            .push(" OR analysis_result LIKE ")
            .push_bind(pattern.clone())
            .push(" OR tags LIKE ")
            .push_bind(pattern)
            .push(")");
        sep = joiner;
    }
}

pub trait CaseStore: Send + Sync + 'static {
    fn insert_case(
        &self,
        case: CaseRecord,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn search_cases(
        &self,
        query: &CaseQuery,
    ) -> impl Future<Output = Result<Vec<CaseRecord>, sqlx::Error>> + Send;
    fn recent_cases(
        &self,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<CaseRecord>, sqlx::Error>> + Send;
    /// Cases satisfying every populated term.  Callers must check
    /// [`SimilarityTerms::is_empty`] first; an empty term set has no
    /// well-formed WHERE clause.
    fn match_all_terms(
        &self,
        terms: &SimilarityTerms,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<CaseRecord>, sqlx::Error>> + Send;
    /// Cases satisfying at least one populated term.
    fn match_any_term(
        &self,
        terms: &SimilarityTerms,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<CaseRecord>, sqlx::Error>> + Send;
    fn count_cases(&self) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;
}

impl CaseStore for SqliteStore {
    async fn insert_case(&self, case: CaseRecord) -> Result<(), sqlx::Error> {
        let reported_at = case.reported_at.to_rfc3339();
        let created_at = case.created_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO analysis_cases \
             (id, customer, product_model, lot_id, cell_id, defect_type, defect_description, \
              root_cause, analysis_result, corrective_action, tags, reported_at, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&case.id)
        .bind(&case.customer)
        .bind(&case.product_model)
        .bind(&case.lot_id)
        .bind(&case.cell_id)
        .bind(&case.defect_type)
        .bind(&case.defect_description)
        .bind(&case.root_cause)
        .bind(&case.analysis_result)
        .bind(&case.corrective_action)
        .bind(&case.tags)
        .bind(&reported_at)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn search_cases(&self, query: &CaseQuery) -> Result<Vec<CaseRecord>, sqlx::Error> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {CASE_COLUMNS} FROM analysis_cases WHERE 1 = 1"
        ));
        if let Some(customer) = &query.customer {
            builder
                .push(" AND customer LIKE ")
                .push_bind(format!("%{customer}%"));
        }
        if let Some(model) = &query.product_model {
            builder
                .push(" AND product_model LIKE ")
                .push_bind(format!("%{model}%"));
        }
        if let Some(defect) = &query.defect_type {
            builder.push(" AND defect_type = ").push_bind(defect.clone());
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            builder
                .push(" AND (defect_description LIKE ")
                .push_bind(pattern.clone())
                .push(" OR root_cause LIKE ")
                .push_bind(pattern.clone())
                .push(" OR analysis_result LIKE ")
                .push_bind(pattern.clone())
                .push(" OR corrective_action LIKE ")
                .push_bind(pattern.clone())
                .push(" OR tags LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        builder
            .push(" ORDER BY reported_at DESC LIMIT ")
            .push_bind(query.limit);

        builder.build_query_as().fetch_all(&self.pool).await
    }

    async fn recent_cases(&self, limit: i64) -> Result<Vec<CaseRecord>, sqlx::Error> {
        sqlx::query_as(&format!(
            "SELECT {CASE_COLUMNS} FROM analysis_cases ORDER BY reported_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    async fn match_all_terms(
        &self,
        terms: &SimilarityTerms,
        limit: i64,
    ) -> Result<Vec<CaseRecord>, sqlx::Error> {
        self.match_terms(terms, " AND ", limit).await
    }

    async fn match_any_term(
        &self,
        terms: &SimilarityTerms,
        limit: i64,
    ) -> Result<Vec<CaseRecord>, sqlx::Error> {
        self.match_terms(terms, " OR ", limit).await
    }

    async fn count_cases(&self) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM analysis_cases")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

impl SqliteStore {
    async fn match_terms(
        &self,
        terms: &SimilarityTerms,
        joiner: &str,
        limit: i64,
    ) -> Result<Vec<CaseRecord>, sqlx::Error> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT {CASE_COLUMNS} FROM analysis_cases WHERE "
        ));
        push_term_groups(&mut builder, terms, joiner);
        builder
            .push(" ORDER BY reported_at DESC LIMIT ")
            .push_bind(limit);

        builder.build_query_as().fetch_all(&self.pool).await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
