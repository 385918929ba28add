use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use ikebana_qubo::{
    optimize_base, optimize_extension, ArrangementRequest, BaseReport, BranchChoice,
    ExtensionCandidates, ExtensionReport, Orientation, Role, SimulatedAnnealer,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::{default_catalog, vessel_for};
use crate::database;
use crate::models::{
    ApiError, ApiResponse, Branch, ExtendRequest, NewArrangement, OptimizeQuery, OptimizeResponse,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub num_reads: usize,
    pub sweeps: usize,
}

impl AppState {
    fn sampler(&self) -> (SimulatedAnnealer, StdRng) {
        (SimulatedAnnealer::from_entropy().with_sweeps(self.sweeps), StdRng::from_entropy())
    }
}

// アニーリングは同期処理なので blocking スレッドで回す
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ikebana_qubo::ArrangementError> + Send + 'static,
    T: Send + 'static,
{
    let out = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("optimizer task failed: {e}")))?;
    Ok(out?)
}

fn choices<'a>(
    roles: &[Role],
    branch: impl Fn(Role) -> Option<&'a BranchChoice>,
) -> Vec<(Role, BranchChoice)> {
    roles
        .iter()
        .filter_map(|&role| branch(role).map(|c| (role, c.clone())))
        .collect()
}

pub async fn optimize(
    State(state): State<AppState>,
    Query(query): Query<OptimizeQuery>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    let vase = query.vase.unwrap_or_default();
    let vessel = vessel_for(&vase);
    let request = ArrangementRequest {
        vessel,
        catalog: default_catalog()?,
        forced_flower: query.forced_flower,
        front: Orientation::default(),
    };
    info!(vase = %vase, forced = ?request.forced_flower, "optimize");

    let (mut sampler, mut rng) = state.sampler();
    let num_reads = state.num_reads;
    let solution =
        run_blocking(move || optimize_base(&request, &mut sampler, &mut rng, num_reads)).await?;

    let branches = choices(&Role::BASE, |role| solution.branch(role));
    let arr_id = database::save_arrangement(
        &state.pool,
        &NewArrangement {
            artist: "unknown".to_string(),
            comment: String::new(),
            vase_width: vessel.width,
            vase_height: vessel.height,
        },
        &branches,
    )
    .await?;
    info!(arr_id, energy = solution.energy, "arrangement saved");

    Ok(Json(OptimizeResponse {
        report: BaseReport::from(&solution),
        arr_id,
    }))
}

pub async fn optimize_extend(
    State(state): State<AppState>,
    Json(payload): Json<ExtendRequest>,
) -> Result<Json<ExtensionReport>, ApiError> {
    if database::get_arrangement(&state.pool, payload.arr_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("arrangement {}", payload.arr_id)));
    }
    let base = payload.base.to_arrangement()?;

    let (mut sampler, mut rng) = state.sampler();
    let num_reads = state.num_reads;
    let ext = run_blocking(move || {
        let candidates = ExtensionCandidates::default();
        optimize_extension(&base, &candidates, &mut sampler, &mut rng, num_reads)
    })
    .await?;

    let branches = choices(&Role::EXTENSION, |role| ext.branch(role));
    database::save_branches(&state.pool, payload.arr_id, &branches).await?;
    info!(arr_id = payload.arr_id, energy = ext.energy, "extension saved");

    Ok(Json(ExtensionReport::from(&ext)))
}

pub async fn list_branches(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Branch>>>, ApiError> {
    if database::get_arrangement(&state.pool, id).await?.is_none() {
        return Err(ApiError::NotFound(format!("arrangement {id}")));
    }
    let branches = database::get_branches(&state.pool, id).await?;
    Ok(Json(ApiResponse {
        success: true,
        data: Some(branches),
        message: Some("Branches retrieved successfully".to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use ikebana_qubo::BaseInputs;

    async fn state() -> AppState {
        AppState {
            pool: database::memory_pool().await,
            num_reads: 2,
            sweeps: 50,
        }
    }

    fn query(vase: &str) -> OptimizeQuery {
        OptimizeQuery {
            vase: Some(vase.to_string()),
            forced_flower: Some(String::new()),
        }
    }

    #[tokio::test]
    async fn optimize_saves_four_branches() {
        let state = state().await;
        let Json(response) = optimize(State(state.clone()), Query(query("筒型花器")))
            .await
            .unwrap();

        let arrangement = database::get_arrangement(&state.pool, response.arr_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(arrangement.vase_height, 20.0);
        assert_eq!(arrangement.artist, "unknown");

        let Json(listed) = list_branches(Path(response.arr_id), State(state)).await.unwrap();
        let roles: Vec<String> = listed.data.unwrap().into_iter().map(|b| b.role).collect();
        assert_eq!(roles, ["main", "guest", "middle1", "middle2"]);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["arr_id"], serde_json::json!(response.arr_id));
        assert!(value["Q"].as_object().is_some_and(|q| !q.is_empty()));
        assert!(value["flowers"]["sakura"].is_number());
    }

    fn resolved_base() -> BaseInputs {
        serde_json::from_value(serde_json::json!({
            "base_assignments": {
                "main": "dill", "guest": "rose", "middle1": "lily", "middle2": "peony"
            },
            "base_lengths": {"main": 50, "guest": 15, "middle1": 23, "middle2": 17},
            "base_angles": {
                "mainAzimuth": 0, "mainElevation": 0,
                "guestAzimuth": 0, "guestElevation": 45,
                "middle1Azimuth": 40, "middle1Elevation": 40,
                "middle2Azimuth": -40, "middle2Elevation": 40
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn extend_appends_middle3_and_middle4() {
        let state = state().await;
        let arr_id = database::save_arrangement(
            &state.pool,
            &NewArrangement {
                artist: "unknown".to_string(),
                comment: String::new(),
                vase_width: 10.0,
                vase_height: 15.0,
            },
            &[],
        )
        .await
        .unwrap();

        let request = ExtendRequest {
            arr_id,
            base: resolved_base(),
        };
        let Json(report) = optimize_extend(State(state.clone()), Json(request)).await.unwrap();
        assert!(report.assignments.contains_key(&Role::Middle3));
        assert!(report.angles.contains_key("middle4Elevation"));

        let rows = database::get_branches(&state.pool, arr_id).await.unwrap();
        let roles: Vec<&str> = rows.iter().map(|b| b.role.as_str()).collect();
        assert_eq!(roles, ["middle3", "middle4"]);
    }

    #[tokio::test]
    async fn extend_rejects_unknown_arrangement() {
        let state = state().await;
        let request = ExtendRequest {
            arr_id: 999,
            base: resolved_base(),
        };
        let err = optimize_extend(State(state), Json(request)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn extend_rejects_incomplete_base() {
        let state = state().await;
        let arr_id = database::save_arrangement(
            &state.pool,
            &NewArrangement {
                artist: "unknown".to_string(),
                comment: String::new(),
                vase_width: 10.0,
                vase_height: 15.0,
            },
            &[],
        )
        .await
        .unwrap();
        let mut base = resolved_base();
        base.base_lengths.remove("main");
        let err = optimize_extend(State(state), Json(ExtendRequest { arr_id, base }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn branches_of_missing_arrangement_is_not_found() {
        let state = state().await;
        let err = list_branches(Path(5), State(state)).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
