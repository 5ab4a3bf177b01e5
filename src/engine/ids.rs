//! Stable indicator ids of the standard calculators.

use crate::domain::IndicatorId;

// Balances (snapshot only)
pub const TOTAL_ASSETS_PRIMARY: IndicatorId = IndicatorId::new(101);
pub const TOTAL_ASSETS_SECONDARY: IndicatorId = IndicatorId::new(102);
pub const TOTAL_SHARES: IndicatorId = IndicatorId::new(103);
pub const SHARE_PRICE: IndicatorId = IndicatorId::new(104);
pub const ACCOUNT_COUNT: IndicatorId = IndicatorId::new(105);
pub const DISTINCT_ASSET_COUNT: IndicatorId = IndicatorId::new(106);
pub const MARKET_PRICED_VALUE: IndicatorId = IndicatorId::new(107);
pub const MANUALLY_VALUED_VALUE: IndicatorId = IndicatorId::new(108);
pub const REFERENCE_CASH_VALUE: IndicatorId = IndicatorId::new(109);

// Market (live lookups)
pub const CIRCULATING_SUPPLY: IndicatorId = IndicatorId::new(201);
pub const MARKET_BID_PRICE: IndicatorId = IndicatorId::new(202);
pub const ISSUER_HELD_SHARES: IndicatorId = IndicatorId::new(203);
pub const POOLED_SHARES: IndicatorId = IndicatorId::new(204);
pub const REFERENCE_CROSS_RATE: IndicatorId = IndicatorId::new(205);

// Ratios
pub const MARKET_CAP: IndicatorId = IndicatorId::new(301);
pub const BOOK_VALUE_PER_SHARE: IndicatorId = IndicatorId::new(302);
pub const PRICE_TO_BOOK: IndicatorId = IndicatorId::new(303);
pub const CIRCULATING_MARKET_CAP: IndicatorId = IndicatorId::new(304);
pub const MARKET_TO_BOOK: IndicatorId = IndicatorId::new(305);
pub const FREE_FLOAT: IndicatorId = IndicatorId::new(306);

// Dividends
pub const DIVIDENDS_PAID_12M: IndicatorId = IndicatorId::new(401);
pub const DIVIDEND_PER_SHARE_12M: IndicatorId = IndicatorId::new(402);
pub const DIVIDEND_YIELD: IndicatorId = IndicatorId::new(403);
pub const DISTRIBUTION_COUNT_12M: IndicatorId = IndicatorId::new(404);
pub const DIVIDEND_REINVESTMENT_RATE: IndicatorId = IndicatorId::new(405);

// Analytics
pub const SHARE_PRICE_1Y_AGO: IndicatorId = IndicatorId::new(501);
pub const ROI_12M: IndicatorId = IndicatorId::new(502);
pub const TOTAL_RETURN_12M: IndicatorId = IndicatorId::new(503);
pub const LARGEST_HOLDING_WEIGHT: IndicatorId = IndicatorId::new(504);
pub const MANUAL_VALUATION_SHARE: IndicatorId = IndicatorId::new(505);
pub const CASH_RATIO: IndicatorId = IndicatorId::new(506);
pub const NAV_CHANGE_12M: IndicatorId = IndicatorId::new(507);

// Tokenomics
pub const HOLDER_COUNT: IndicatorId = IndicatorId::new(601);
pub const HOLDERS_WITH_ONE_SHARE: IndicatorId = IndicatorId::new(602);
pub const AVERAGE_SHARES_PER_HOLDER: IndicatorId = IndicatorId::new(603);
pub const TOP10_CONCENTRATION: IndicatorId = IndicatorId::new(604);
pub const HOLDERS_PAID_DIVIDENDS: IndicatorId = IndicatorId::new(605);
