use axum::Json;

use crate::services::market::{MarketTrends, market_trends};

pub async fn trends_handler() -> Json<MarketTrends> {
    Json(market_trends())
}
