// src/web/handlers/analysis_handlers.rs
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::AuthenticatedUser;
use crate::database::{Database, NewAnalysis};
use crate::error::{ApiError, ApiResult};
use crate::growth_score;
use crate::web::types::{
    AnalysisDetail, AnalysisDetailData, AnalysisListData, AnalyzeData, AnalyzeRequest,
    ApiResponse, Services,
};

pub const MIN_POSTS_CHARS: usize = 50;

const ANALYSIS_NOT_FOUND: &str = "Analysis not found.";

/// Trimmed post text, or the 400 shown when there is too little of it
fn validated_posts(request: &AnalyzeRequest) -> ApiResult<&str> {
    request
        .posts
        .as_str()
        .map(str::trim)
        .filter(|posts| posts.chars().count() >= MIN_POSTS_CHARS)
        .ok_or_else(|| {
            ApiError::bad_request("Please provide at least 50 characters of LinkedIn post content.")
        })
}

pub async fn create_analysis_handler(
    request: Json<AnalyzeRequest>,
    auth: AuthenticatedUser,
    services: &State<Services>,
    db: &State<Database>,
) -> ApiResult<status::Custom<Json<ApiResponse<AnalyzeData>>>> {
    let posts = validated_posts(&request)?;

    let analysis = services.analyzer.analyze_profile(posts).await?;
    let score = growth_score::breakdown_value(&analysis);
    let growth_plan = services
        .analyzer
        .generate_growth_plan(&analysis, posts)
        .await?;

    let detected_niche = analysis
        .get("detected_niche")
        .and_then(Value::as_str)
        .filter(|niche| !niche.is_empty());

    let saved = db
        .analyses()
        .create(NewAnalysis {
            user_id: auth.id(),
            raw_posts: posts,
            detected_niche,
            growth_score: score.total,
            full_analysis: &analysis,
            growth_plan: &growth_plan,
        })
        .await?;

    info!(
        user_id = %auth.id(),
        analysis_id = %saved.id,
        score = score.total,
        "Profile analysis completed"
    );

    Ok(status::Custom(
        Status::Created,
        Json(ApiResponse::ok(
            AnalyzeData {
                analysis_id: saved.id,
                analysis,
                growth_score: score,
                growth_plan,
            },
            "Profile analysis completed successfully",
        )),
    ))
}

pub async fn list_analyses_handler(
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<Json<ApiResponse<AnalysisListData>>> {
    let analyses = db.analyses().list_for_user(auth.id()).await?;

    Ok(Json(ApiResponse::ok(
        AnalysisListData { analyses },
        "Analyses retrieved",
    )))
}

pub async fn get_analysis_handler(
    id: &str,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<Json<ApiResponse<AnalysisDetailData>>> {
    let row = db
        .analyses()
        .find_for_user(id, auth.id())
        .await?
        .ok_or_else(|| ApiError::not_found(ANALYSIS_NOT_FOUND))?;

    // Recomputed on every read; the stored integer is only for listings
    let score = growth_score::breakdown_stored(&row.full_analysis_json);

    let full_analysis = serde_json::from_str(&row.full_analysis_json).unwrap_or_else(|e| {
        warn!(analysis_id = %row.id, "Stored analysis is not valid JSON: {}", e);
        Value::Null
    });
    let growth_plan = serde_json::from_str(&row.growth_plan_json).unwrap_or_else(|e| {
        warn!(analysis_id = %row.id, "Stored growth plan is not valid JSON: {}", e);
        Value::Null
    });

    Ok(Json(ApiResponse::ok(
        AnalysisDetailData {
            analysis: AnalysisDetail {
                id: row.id,
                raw_posts: row.raw_posts,
                detected_niche: row.detected_niche,
                growth_score: score,
                full_analysis,
                growth_plan,
                created_at: row.created_at,
            },
        },
        "Analysis retrieved",
    )))
}

pub async fn delete_analysis_handler(
    id: &str,
    auth: AuthenticatedUser,
    db: &State<Database>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !db.analyses().delete_for_user(id, auth.id()).await? {
        return Err(ApiError::not_found(ANALYSIS_NOT_FOUND));
    }

    Ok(Json(ApiResponse::empty("Analysis deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(posts: Value) -> AnalyzeRequest {
        AnalyzeRequest { posts }
    }

    #[test]
    fn test_posts_are_trimmed_before_length_check() {
        let padded = format!("   {}   ", "a".repeat(49));
        assert!(validated_posts(&request(json!(padded))).is_err());

        let enough = format!("  {}\n", "a".repeat(50));
        assert_eq!(
            validated_posts(&request(json!(enough))).unwrap(),
            "a".repeat(50)
        );
    }

    #[test]
    fn test_missing_or_non_string_posts_rejected() {
        let err = validated_posts(&request(Value::Null)).unwrap_err();
        assert_eq!(err.status(), Status::BadRequest);
        assert!(validated_posts(&request(json!(["a long enough list entry"]))).is_err());
    }
}
