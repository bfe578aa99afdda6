// src/services/market.rs
//! Illustrative market figures for the trends view. Nothing here is live data.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketPoint {
    pub month: &'static str,
    pub price: u32,
    pub inventory: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketStat {
    pub label: &'static str,
    pub value: &'static str,
    pub trend: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketTrends {
    pub series: &'static [MarketPoint],
    pub stats: &'static [MarketStat],
}

const fn point(month: &'static str, price: u32, inventory: u32) -> MarketPoint {
    MarketPoint { month, price, inventory }
}

pub const MONTHLY_SERIES: [MarketPoint; 12] = [
    point("Jan", 450_000, 120),
    point("Feb", 455_000, 115),
    point("Mar", 462_000, 105),
    point("Apr", 470_000, 98),
    point("May", 485_000, 90),
    point("Jun", 495_000, 85),
    point("Jul", 490_000, 95),
    point("Aug", 482_000, 110),
    point("Sep", 475_000, 130),
    point("Oct", 470_000, 145),
    point("Nov", 465_000, 155),
    point("Dec", 468_000, 140),
];

pub const HEADLINE_STATS: [MarketStat; 3] = [
    MarketStat { label: "Avg. Days on Market", value: "24", trend: "-4.2%" },
    MarketStat { label: "Inventory Growth", value: "142", trend: "+12.5%" },
    MarketStat { label: "Price/Sq. Ft", value: "$412", trend: "+2.1%" },
];

pub fn market_trends() -> MarketTrends {
    MarketTrends {
        series: &MONTHLY_SERIES,
        stats: &HEADLINE_STATS,
    }
}
