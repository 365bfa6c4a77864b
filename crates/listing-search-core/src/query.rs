//! Provider query construction.
//!
//! A [`SearchFilter`] is first lowered to an ordered list of [`Clause`]s
//! using a provider's [`FieldNames`], then an encoder turns those clauses
//! into the provider's wire form:
//!
//! | Encoder | Provider style | Output |
//! |---------|----------------|--------|
//! | [`ODataEncoder`] | RESO Web API (Bridge) | `$filter=City eq 'X' and ListPrice ge 1` URL params |
//! | [`ResoJsonEncoder`] | MLS Grid style | `{"Query": {"ListPrice": {"Min": 1}}, ...}` body |
//! | [`FlatJsonEncoder`] | RentSpree style | `{"filters": {"min_price": 1}, ...}` body |
//!
//! Only constraints present in the filter are emitted. Clause order is fixed
//! (it follows the form order) so encodings are stable.

use std::fmt;

use serde_json::{json, Map, Value};

use crate::models::SearchFilter;

/// Comparison operator of a single clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `>=`, used for minimums.
    Ge,
    /// `<=`, used for maximums.
    Le,
    /// Equality, used for categorical fields.
    Eq,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Ge => write!(f, "ge"),
            Op::Le => write!(f, "le"),
            Op::Eq => write!(f, "eq"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseValue {
    Int(u64),
    Text(String),
}

impl ClauseValue {
    fn to_json(&self) -> Value {
        match self {
            ClauseValue::Int(n) => json!(n),
            ClauseValue::Text(s) => json!(s),
        }
    }
}

/// One `field operator value` constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: &'static str,
    pub op: Op,
    pub value: ClauseValue,
}

impl Clause {
    /// OData form: `City eq 'Reston'`, `ListPrice ge 200000`.
    pub fn to_odata(&self) -> String {
        match &self.value {
            ClauseValue::Int(n) => format!("{} {} {}", self.field, self.op, n),
            ClauseValue::Text(s) => {
                format!("{} {} '{}'", self.field, self.op, s.replace('\'', "''"))
            }
        }
    }
}

/// Provider field names for each filter attribute.
#[derive(Debug, Clone, Copy)]
pub struct FieldNames {
    pub location: &'static str,
    pub property_type: &'static str,
    pub min_bedrooms: &'static str,
    pub min_bathrooms: &'static str,
    pub min_price: &'static str,
    pub max_price: &'static str,
    pub min_living_area: &'static str,
    pub max_days_on_market: &'static str,
    pub status: &'static str,
}

/// RESO Data Dictionary names (Bridge, MLS Grid).
pub const RESO_FIELDS: FieldNames = FieldNames {
    location: "City",
    property_type: "PropertyType",
    min_bedrooms: "BedroomsTotal",
    min_bathrooms: "BathroomsTotalInteger",
    min_price: "ListPrice",
    max_price: "ListPrice",
    min_living_area: "LivingArea",
    max_days_on_market: "DaysOnMarket",
    status: "StandardStatus",
};

/// Flat snake_case names (RentSpree).
pub const FLAT_FIELDS: FieldNames = FieldNames {
    location: "location",
    property_type: "property_type",
    min_bedrooms: "min_bedrooms",
    min_bathrooms: "min_bathrooms",
    min_price: "min_price",
    max_price: "max_price",
    min_living_area: "min_square_feet",
    max_days_on_market: "days_on_market",
    status: "status",
};

/// RESO fields requested from OData providers; matches what the RESO mapper reads.
pub const RESO_SELECT: [&str; 15] = [
    "ListingId",
    "UnparsedAddress",
    "City",
    "StateOrProvince",
    "PostalCode",
    "ListPrice",
    "BedroomsTotal",
    "BathroomsTotalInteger",
    "LivingArea",
    "DaysOnMarket",
    "PropertyType",
    "StandardStatus",
    "ListingKeyNumeric",
    "PublicRemarks",
    "Media",
];

/// Lower a filter into clauses, one per set field, in form order.
///
/// A maximum price at the "no max" sentinel is omitted.
pub fn clauses(filter: &SearchFilter, names: &FieldNames) -> Vec<Clause> {
    let mut out = Vec::new();
    let mut push = |field: &'static str, op: Op, value: Option<ClauseValue>| {
        if let Some(value) = value {
            out.push(Clause { field, op, value });
        }
    };

    push(
        names.location,
        Op::Eq,
        filter.location.clone().map(ClauseValue::Text),
    );
    push(
        names.property_type,
        Op::Eq,
        filter.property_type.clone().map(ClauseValue::Text),
    );
    push(
        names.min_bedrooms,
        Op::Ge,
        filter.min_bedrooms.map(|n| ClauseValue::Int(n.into())),
    );
    push(
        names.min_bathrooms,
        Op::Ge,
        filter.min_bathrooms.map(|n| ClauseValue::Int(n.into())),
    );
    push(names.min_price, Op::Ge, filter.min_price.map(ClauseValue::Int));
    push(
        names.max_price,
        Op::Le,
        filter.bounded_max_price().map(ClauseValue::Int),
    );
    push(
        names.min_living_area,
        Op::Ge,
        filter.min_living_area_sqft.map(|n| ClauseValue::Int(n.into())),
    );
    push(
        names.max_days_on_market,
        Op::Le,
        filter.max_days_on_market.map(|n| ClauseValue::Int(n.into())),
    );
    push(
        names.status,
        Op::Eq,
        filter.status.clone().map(ClauseValue::Text),
    );

    out
}

/// Wire form of a provider query.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderQuery {
    /// URL query parameters for a `GET`.
    Params(Vec<(String, String)>),
    /// JSON body for a `POST`.
    Json(Value),
}

/// Encodes a [`SearchFilter`] in one provider's query convention.
pub trait QueryEncoder: Send + Sync {
    fn encode(&self, filter: &SearchFilter) -> ProviderQuery;
}

// ═══════════════════════════════════════════════════════════════════════
// OData (RESO Web API)
// ═══════════════════════════════════════════════════════════════════════

/// `$filter` / `$top` / `$orderby` / `$select` query for RESO Web API
/// endpoints such as Bridge Interactive.
#[derive(Debug, Clone)]
pub struct ODataEncoder {
    pub top: usize,
}

impl QueryEncoder for ODataEncoder {
    fn encode(&self, filter: &SearchFilter) -> ProviderQuery {
        let parts: Vec<String> = clauses(filter, &RESO_FIELDS)
            .iter()
            .map(Clause::to_odata)
            .collect();

        let mut params = Vec::new();
        if !parts.is_empty() {
            params.push(("$filter".to_string(), parts.join(" and ")));
        }
        params.push(("$top".to_string(), self.top.to_string()));
        params.push((
            "$orderby".to_string(),
            "ModificationTimestamp desc".to_string(),
        ));
        params.push(("$select".to_string(), RESO_SELECT.join(",")));
        ProviderQuery::Params(params)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// JSON bodies
// ═══════════════════════════════════════════════════════════════════════

/// RESO-named JSON body with `{"Min": n}` / `{"Max": n}` range objects.
#[derive(Debug, Clone)]
pub struct ResoJsonEncoder {
    pub limit: usize,
}

impl QueryEncoder for ResoJsonEncoder {
    fn encode(&self, filter: &SearchFilter) -> ProviderQuery {
        let mut query = Map::new();
        for clause in clauses(filter, &RESO_FIELDS) {
            let bound = match clause.op {
                Op::Eq => {
                    query.insert(clause.field.to_string(), clause.value.to_json());
                    continue;
                }
                Op::Ge => "Min",
                Op::Le => "Max",
            };
            let entry = query
                .entry(clause.field.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(range) = entry {
                range.insert(bound.to_string(), clause.value.to_json());
            }
        }

        ProviderQuery::Json(json!({
            "Query": Value::Object(query),
            "Limit": self.limit,
            "Offset": 0,
        }))
    }
}

/// Flat snake_case JSON body, optionally tagged with the agent it is sent for.
#[derive(Debug, Clone)]
pub struct FlatJsonEncoder {
    pub agent_id: Option<String>,
    pub limit: usize,
}

impl QueryEncoder for FlatJsonEncoder {
    fn encode(&self, filter: &SearchFilter) -> ProviderQuery {
        let filters: Map<String, Value> = clauses(filter, &FLAT_FIELDS)
            .into_iter()
            .map(|c| (c.field.to_string(), c.value.to_json()))
            .collect();

        let mut body = json!({
            "filters": Value::Object(filters),
            "limit": self.limit,
            "offset": 0,
        });
        if let Some(agent) = &self.agent_id {
            body["agent_id"] = json!(agent);
        }
        ProviderQuery::Json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNBOUNDED_MAX_PRICE;

    fn full_filter() -> SearchFilter {
        SearchFilter {
            location: Some("Arlington".into()),
            property_type: Some("Condo".into()),
            min_bedrooms: Some(2),
            min_bathrooms: Some(1),
            min_price: Some(200_000),
            max_price: Some(400_000),
            min_living_area_sqft: Some(900),
            max_days_on_market: Some(14),
            status: Some("Active".into()),
        }
    }

    fn params(q: ProviderQuery) -> Vec<(String, String)> {
        match q {
            ProviderQuery::Params(p) => p,
            other => panic!("expected params, got {:?}", other),
        }
    }

    fn body(q: ProviderQuery) -> Value {
        match q {
            ProviderQuery::Json(v) => v,
            other => panic!("expected json, got {:?}", other),
        }
    }

    #[test]
    fn test_unset_filter_emits_no_clauses() {
        assert!(clauses(&SearchFilter::default(), &RESO_FIELDS).is_empty());
    }

    #[test]
    fn test_one_clause_per_set_field_with_operator() {
        let cs = clauses(&full_filter(), &RESO_FIELDS);
        assert_eq!(cs.len(), 9);

        let ops: Vec<(&str, Op)> = cs.iter().map(|c| (c.field, c.op)).collect();
        assert_eq!(
            ops,
            vec![
                ("City", Op::Eq),
                ("PropertyType", Op::Eq),
                ("BedroomsTotal", Op::Ge),
                ("BathroomsTotalInteger", Op::Ge),
                ("ListPrice", Op::Ge),
                ("ListPrice", Op::Le),
                ("LivingArea", Op::Ge),
                ("DaysOnMarket", Op::Le),
                ("StandardStatus", Op::Eq),
            ]
        );
    }

    #[test]
    fn test_each_single_field_yields_single_clause() {
        let singles = [
            SearchFilter { location: Some("Vienna".into()), ..Default::default() },
            SearchFilter { min_bedrooms: Some(3), ..Default::default() },
            SearchFilter { max_price: Some(500_000), ..Default::default() },
            SearchFilter { max_days_on_market: Some(7), ..Default::default() },
            SearchFilter { status: Some("Active".into()), ..Default::default() },
        ];
        for f in &singles {
            assert_eq!(clauses(f, &RESO_FIELDS).len(), 1, "filter {:?}", f);
        }
    }

    #[test]
    fn test_sentinel_max_price_is_omitted() {
        let f = SearchFilter {
            min_price: Some(100_000),
            max_price: Some(UNBOUNDED_MAX_PRICE),
            ..Default::default()
        };
        let cs = clauses(&f, &RESO_FIELDS);
        assert_eq!(cs.len(), 1);
        assert_eq!(cs[0].op, Op::Ge);
    }

    #[test]
    fn test_odata_filter_string() {
        let f = SearchFilter {
            location: Some("Falls Church".into()),
            min_bedrooms: Some(3),
            max_price: Some(400_000),
            ..Default::default()
        };
        let p = params(ODataEncoder { top: 50 }.encode(&f));
        assert_eq!(p[0].0, "$filter");
        assert_eq!(
            p[0].1,
            "City eq 'Falls Church' and BedroomsTotal ge 3 and ListPrice le 400000"
        );
        assert!(p.contains(&("$top".to_string(), "50".to_string())));
        assert!(p
            .iter()
            .any(|(k, v)| k == "$select" && v.contains("ListingKeyNumeric")));
    }

    #[test]
    fn test_odata_escapes_quotes() {
        let f = SearchFilter {
            location: Some("O'Fallon".into()),
            ..Default::default()
        };
        let p = params(ODataEncoder { top: 10 }.encode(&f));
        assert_eq!(p[0].1, "City eq 'O''Fallon'");
    }

    #[test]
    fn test_odata_without_constraints_has_no_filter_param() {
        let p = params(ODataEncoder { top: 50 }.encode(&SearchFilter::default()));
        assert!(p.iter().all(|(k, _)| k != "$filter"));
    }

    #[test]
    fn test_reso_json_ranges() {
        let b = body(ResoJsonEncoder { limit: 50 }.encode(&full_filter()));
        assert_eq!(b["Query"]["ListPrice"], json!({"Min": 200000, "Max": 400000}));
        assert_eq!(b["Query"]["BedroomsTotal"], json!({"Min": 2}));
        assert_eq!(b["Query"]["DaysOnMarket"], json!({"Max": 14}));
        assert_eq!(b["Query"]["City"], json!("Arlington"));
        assert_eq!(b["Limit"], json!(50));
    }

    #[test]
    fn test_reso_json_only_present_constraints() {
        let f = SearchFilter {
            min_price: Some(300_000),
            ..Default::default()
        };
        let b = body(ResoJsonEncoder { limit: 50 }.encode(&f));
        let query = b["Query"].as_object().unwrap();
        assert_eq!(query.len(), 1);
        assert_eq!(b["Query"]["ListPrice"], json!({"Min": 300000}));
    }

    #[test]
    fn test_flat_json_body() {
        let enc = FlatJsonEncoder {
            agent_id: Some("agent-7".into()),
            limit: 25,
        };
        let f = SearchFilter {
            location: Some("Reston".into()),
            min_living_area_sqft: Some(1200),
            ..Default::default()
        };
        let b = body(enc.encode(&f));
        assert_eq!(b["agent_id"], json!("agent-7"));
        assert_eq!(
            b["filters"],
            json!({"location": "Reston", "min_square_feet": 1200})
        );
        assert_eq!(b["limit"], json!(25));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let enc = ODataEncoder { top: 50 };
        assert_eq!(enc.encode(&full_filter()), enc.encode(&full_filter()));
    }
}
