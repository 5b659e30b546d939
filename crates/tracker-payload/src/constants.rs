//! Protocol constants: payload keys, event codes, and schema URIs.

/// Vendor segment of the collector POST path.
pub const PROTOCOL_VENDOR: &str = "com.snowplowanalytics.snowplow";

/// Protocol version segment of the collector POST path.
pub const PROTOCOL_VERSION: &str = "tp2";

/// Path used for single-event GET requests.
pub const GET_PATH: &str = "i";

/// Content type of POST bodies.
pub const POST_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Iglu schema URIs.
pub mod schema {
    pub const PAYLOAD_DATA: &str =
        "iglu:com.snowplowanalytics.snowplow/payload_data/jsonschema/1-0-4";
    pub const CONTEXTS: &str = "iglu:com.snowplowanalytics.snowplow/contexts/jsonschema/1-0-1";
    pub const SELF_DESCRIBING_EVENT: &str =
        "iglu:com.snowplowanalytics.snowplow/unstruct_event/jsonschema/1-0-0";
    pub const SCREEN_VIEW: &str = "iglu:com.snowplowanalytics.snowplow/screen_view/jsonschema/1-0-0";
    pub const USER_TIMINGS: &str = "iglu:com.snowplowanalytics.snowplow/timing/jsonschema/1-0-0";
}

/// Values of the `e` key.
pub mod event_type {
    pub const PAGE_VIEW: &str = "pv";
    pub const STRUCTURED: &str = "se";
    pub const SELF_DESCRIBING: &str = "ue";
    pub const ECOMMERCE_TRANSACTION: &str = "tr";
    pub const ECOMMERCE_ITEM: &str = "ti";
}

/// Short keys of the flattened payload.
pub mod keys {
    // General
    pub const SCHEMA: &str = "schema";
    pub const DATA: &str = "data";
    pub const EVENT: &str = "e";
    pub const EVENT_ID: &str = "eid";
    pub const TRUE_TIMESTAMP: &str = "ttm";
    pub const DEVICE_CREATED_TIMESTAMP: &str = "dtm";
    pub const DEVICE_SENT_TIMESTAMP: &str = "stm";
    pub const TRACKER_VERSION: &str = "tv";
    pub const APP_ID: &str = "aid";
    pub const NAMESPACE: &str = "tna";
    pub const PLATFORM: &str = "p";

    pub const CONTEXT: &str = "co";
    pub const CONTEXT_ENCODED: &str = "cx";
    pub const SELF_DESCRIBING: &str = "ue_pr";
    pub const SELF_DESCRIBING_ENCODED: &str = "ue_px";

    // Subject
    pub const UID: &str = "uid";
    pub const RESOLUTION: &str = "res";
    pub const VIEWPORT: &str = "vp";
    pub const COLOR_DEPTH: &str = "cd";
    pub const TIMEZONE: &str = "tz";
    pub const LANGUAGE: &str = "lang";
    pub const IP_ADDRESS: &str = "ip";
    pub const USERAGENT: &str = "ua";
    pub const DOMAIN_UID: &str = "duid";
    pub const NETWORK_UID: &str = "tnuid";
    pub const SESSION_UID: &str = "sid";

    // Page view
    pub const PAGE_URL: &str = "url";
    pub const PAGE_TITLE: &str = "page";
    pub const PAGE_REFR: &str = "refr";

    // Structured event
    pub const SE_CATEGORY: &str = "se_ca";
    pub const SE_ACTION: &str = "se_ac";
    pub const SE_LABEL: &str = "se_la";
    pub const SE_PROPERTY: &str = "se_pr";
    pub const SE_VALUE: &str = "se_va";

    // Ecommerce transaction
    pub const TR_ID: &str = "tr_id";
    pub const TR_TOTAL: &str = "tr_tt";
    pub const TR_AFFILIATION: &str = "tr_af";
    pub const TR_TAX: &str = "tr_tx";
    pub const TR_SHIPPING: &str = "tr_sh";
    pub const TR_CITY: &str = "tr_ci";
    pub const TR_STATE: &str = "tr_st";
    pub const TR_COUNTRY: &str = "tr_co";
    pub const TR_CURRENCY: &str = "tr_cu";

    // Transaction item
    pub const TI_ITEM_ID: &str = "ti_id";
    pub const TI_ITEM_SKU: &str = "ti_sk";
    pub const TI_ITEM_NAME: &str = "ti_nm";
    pub const TI_ITEM_CATEGORY: &str = "ti_ca";
    pub const TI_ITEM_PRICE: &str = "ti_pr";
    pub const TI_ITEM_QUANTITY: &str = "ti_qu";
    pub const TI_ITEM_CURRENCY: &str = "ti_cu";

    // Screen view (self-describing body)
    pub const SV_ID: &str = "id";
    pub const SV_NAME: &str = "name";

    // User timing (self-describing body)
    pub const UT_CATEGORY: &str = "category";
    pub const UT_VARIABLE: &str = "variable";
    pub const UT_TIMING: &str = "timing";
    pub const UT_LABEL: &str = "label";
}

/// Keys the payload builder stamps itself; callers may not add them.
pub(crate) const RESERVED_KEYS: [&str; 4] = [
    keys::EVENT_ID,
    keys::DEVICE_CREATED_TIMESTAMP,
    keys::TRUE_TIMESTAMP,
    keys::DEVICE_SENT_TIMESTAMP,
];

/// Collector path for batched POST requests, relative to the collector URL.
pub fn post_path() -> String {
    format!("{}/{}", PROTOCOL_VENDOR, PROTOCOL_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_path_matches_collector_route() {
        assert_eq!(post_path(), "com.snowplowanalytics.snowplow/tp2");
    }

    #[test]
    fn reserved_keys_are_the_stamped_ones() {
        assert!(RESERVED_KEYS.contains(&"eid"));
        assert!(RESERVED_KEYS.contains(&"stm"));
        assert!(!RESERVED_KEYS.contains(&"e"));
    }
}
