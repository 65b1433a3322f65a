use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::SearchCache;
use crate::catalog::Catalog;
use crate::config::{Config, MAX_SEARCH_LIMIT};
use crate::update::UpdateService;
use neuro_common::assessment::{self, Hit6Result, MidasResult};
use neuro_common::mcp_api::{
    CategoryListResponse, GetPathologyParams, GetTreatmentParams, Hit6Params,
    ListCategoryParams, MidasParams, PathologyDetailResponse, RankTreatmentsParams,
    RankTreatmentsResponse, ReloadDataResponse, SearchParams, SearchResponse,
    TreatmentDetailResponse,
};
use neuro_common::model::TreatmentType;

#[derive(Clone)]
pub struct NeuroSearchServer {
    catalog: Arc<RwLock<Catalog>>,
    cache: Arc<SearchCache>,
    update_service: Arc<UpdateService>,
    default_limit: usize,
    tool_router: ToolRouter<NeuroSearchServer>,
}

impl NeuroSearchServer {
    pub fn new(catalog: Catalog, cache: Arc<SearchCache>, config: Config) -> Self {
        let default_limit = config.default_limit;
        let update_service = Arc::new(UpdateService::new(config, Arc::clone(&cache)));
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            cache,
            update_service,
            default_limit,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl NeuroSearchServer {
    #[tool(
        description = "Search pathologies, treatments, brands and categories. Accent and case \
                       insensitive; results come ranked and grouped by kind."
    )]
    async fn search(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<Json<SearchResponse>, String> {
        let query = params.query.trim().to_string();
        if query.is_empty() {
            return Err("query must not be empty".to_string());
        }
        let limit = params
            .limit
            .map(|l| l as usize)
            .unwrap_or(self.default_limit)
            .clamp(1, MAX_SEARCH_LIMIT);

        let catalog = self.catalog.read().await;
        if let Some(cached) = self.cache.get(catalog.fingerprint(), &query, limit) {
            return Ok(Json(cached));
        }

        let response = catalog.search(&query, limit);
        self.cache.put(catalog.fingerprint(), &query, limit, &response);
        debug!(
            query = %query,
            results = response.results.len(),
            cached = self.cache.len(),
            "search computed"
        );
        Ok(Json(response))
    }

    #[tool(description = "Get a treatment by slug (e.g. 'sumatriptan') with its trials and evidence score breakdown.")]
    async fn get_treatment(
        &self,
        Parameters(params): Parameters<GetTreatmentParams>,
    ) -> Result<Json<TreatmentDetailResponse>, String> {
        let slug = params.slug.trim().to_lowercase();
        if slug.is_empty() {
            return Err("slug must not be empty".to_string());
        }

        let catalog = self.catalog.read().await;
        catalog
            .treatment_detail(&slug)
            .map(Json)
            .ok_or_else(|| format!("treatment not found: {slug}"))
    }

    #[tool(description = "List the treatments of a category, given its slug or label (e.g. 'Triptans').")]
    async fn list_category(
        &self,
        Parameters(params): Parameters<ListCategoryParams>,
    ) -> Result<Json<CategoryListResponse>, String> {
        let category = params.category.trim();
        if category.is_empty() {
            return Err("category must not be empty".to_string());
        }

        let catalog = self.catalog.read().await;
        catalog
            .category(category)
            .map(Json)
            .ok_or_else(|| format!("unknown category: '{category}'"))
    }

    #[tool(description = "Get a pathology by slug with the treatments linked to it.")]
    async fn get_pathology(
        &self,
        Parameters(params): Parameters<GetPathologyParams>,
    ) -> Result<Json<PathologyDetailResponse>, String> {
        let slug = params.slug.trim().to_lowercase();
        if slug.is_empty() {
            return Err("slug must not be empty".to_string());
        }

        let catalog = self.catalog.read().await;
        catalog
            .pathology_detail(&slug)
            .map(Json)
            .ok_or_else(|| format!("pathology not found: {slug}"))
    }

    #[tool(
        description = "Rank treatments by evidence score, optionally filtered by treatment type \
                       (maintenance, abortive, emergency, other) and category."
    )]
    async fn rank_treatments(
        &self,
        Parameters(params): Parameters<RankTreatmentsParams>,
    ) -> Result<Json<RankTreatmentsResponse>, String> {
        let treatment_type = params
            .treatment_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_treatment_type)
            .transpose()?;
        let category = params
            .category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let order = params.order.unwrap_or_default();
        let limit = params.limit.map(|l| l as usize);

        let catalog = self.catalog.read().await;
        Ok(Json(RankTreatmentsResponse {
            treatments: catalog.ranked(treatment_type, category, order, limit),
        }))
    }

    #[tool(
        description = "Compute a MIDAS migraine disability score from the five day counts \
                       (0 to 365 each) and grade it I to IV."
    )]
    async fn midas_score(
        &self,
        Parameters(params): Parameters<MidasParams>,
    ) -> Result<Json<MidasResult>, String> {
        assessment::midas(&params.days)
            .map(Json)
            .map_err(|e| format!("invalid MIDAS answers: {e}"))
    }

    #[tool(
        description = "Compute a HIT-6 headache impact score from six answers given as points \
                       (6 never, 8 rarely, 10 sometimes, 11 very often, 13 always)."
    )]
    async fn hit6_score(
        &self,
        Parameters(params): Parameters<Hit6Params>,
    ) -> Result<Json<Hit6Result>, String> {
        assessment::hit6(&params.answers)
            .map(Json)
            .map_err(|e| format!("invalid HIT-6 answers: {e}"))
    }

    #[tool(description = "Reload the data files and rebuild the index if they changed on disk.")]
    async fn reload_data(&self) -> Result<Json<ReloadDataResponse>, String> {
        info!("reload_data tool invoked");

        let current = self.catalog.read().await.fingerprint().to_string();
        let (result, new_catalog) = self
            .update_service
            .update(&current)
            .map_err(|e| format!("reload failed: {e}"))?;

        let mut catalog = self.catalog.write().await;
        if let Some(fresh) = new_catalog {
            *catalog = fresh;
            info!(fingerprint = %result.fingerprint, "in-memory catalog replaced");
        }

        Ok(Json(ReloadDataResponse {
            updated: result.updated,
            fingerprint: result.fingerprint,
            pathology_count: catalog.pathology_count(),
            treatment_count: catalog.treatment_count(),
            entry_count: catalog.entry_count(),
        }))
    }
}

fn parse_treatment_type(label: &str) -> Result<TreatmentType, String> {
    TreatmentType::parse_label(label).ok_or_else(|| {
        let available: Vec<&str> = TreatmentType::ALL.iter().map(|t| t.as_str()).collect();
        format!(
            "unknown treatment type: '{label}'. Available types: {}",
            available.join(", ")
        )
    })
}

#[tool_handler]
impl ServerHandler for NeuroSearchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "neuro-search".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Headache knowledge base MCP server. Use search for free-text lookup across \
                 pathologies, treatments, brands and categories, get_treatment and get_pathology \
                 for detail pages, list_category to browse a treatment class, rank_treatments for \
                 evidence-score tables, midas_score and hit6_score for disability questionnaires, \
                 and reload_data after the data files change."
                    .to_string(),
            ),
        }
    }
}
