//! Request parameters and their validation against the network schema.
//!
//! Validation runs before any provider query, so a rejected request has no
//! side effects.

use geo::Point;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::model::SchemaInfo;
use crate::Error;

/// Either a comma separated string or a list of strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListParam {
    One(String),
    Many(Vec<String>),
}

impl ListParam {
    fn items(&self) -> Vec<String> {
        match self {
            ListParam::One(value) => value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect(),
            ListParam::Many(values) => values
                .iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        }
    }
}

/// A number, a comma separated string of numbers, or a list of either
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValuesParam {
    Number(f64),
    Text(String),
    Many(Vec<JsonValue>),
}

impl ValuesParam {
    fn parse(&self) -> Result<Vec<f64>, Error> {
        let not_numeric = || Error::InvalidParameter("values must be numbers".to_string());
        let values = match self {
            ValuesParam::Number(value) => vec![*value],
            ValuesParam::Text(text) => text
                .split(',')
                .map(|item| item.trim().parse::<f64>().map_err(|_| not_numeric()))
                .collect::<Result<Vec<_>, _>>()?,
            ValuesParam::Many(items) => items
                .iter()
                .map(|item| match item {
                    JsonValue::Number(n) => n.as_f64().ok_or_else(not_numeric),
                    JsonValue::String(s) => s.trim().parse::<f64>().map_err(|_| not_numeric()),
                    _ => Err(not_numeric()),
                })
                .collect::<Result<Vec<_>, _>>()?,
        };

        if values.is_empty() {
            return Err(Error::MissingParameter("values".to_string()));
        }
        if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(Error::InvalidParameter(
                "values can not have null or negative values".to_string(),
            ));
        }
        Ok(values)
    }
}

/// Raw routing request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteParams {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub cost_type: Option<String>,
    pub avoid: Option<ListParam>,
}

/// Raw isocurve request, exactly one of `from` and `to` is expected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsocurveParams {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub cost_type: Option<String>,
    pub avoid: Option<ListParam>,
    pub values: Option<ValuesParam>,
}

/// Validated routing request
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub from: Point<f64>,
    pub to: Point<f64>,
    pub cost_type: String,
    pub avoid: Vec<String>,
}

/// Which way costs are accumulated from the isocurve origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Reachable from the origin
    Forward,
    /// Able to reach the origin
    Backward,
}

/// Validated isocurve request
#[derive(Debug, Clone, PartialEq)]
pub struct IsocurveQuery {
    pub origin: Point<f64>,
    pub direction: Direction,
    pub cost_type: String,
    pub avoid: Vec<String>,
    pub values: Vec<f64>,
}

impl RouteParams {
    pub fn validate(&self, schema: &SchemaInfo) -> Result<RouteQuery, Error> {
        let from = parse_point(required(&self.from, "from")?, "from")?;
        let to = parse_point(required(&self.to, "to")?, "to")?;
        let cost_type = check_type(&self.cost_type, schema)?;
        let avoid = check_avoid(&self.avoid, schema)?;

        Ok(RouteQuery {
            from,
            to,
            cost_type,
            avoid,
        })
    }
}

impl IsocurveParams {
    pub fn validate(&self, schema: &SchemaInfo) -> Result<IsocurveQuery, Error> {
        let (origin, direction) = match (&self.from, &self.to) {
            (Some(from), None) => (parse_point(from, "from")?, Direction::Forward),
            (None, Some(to)) => (parse_point(to, "to")?, Direction::Backward),
            (None, None) => return Err(Error::MissingParameter("from or to".to_string())),
            (Some(_), Some(_)) => return Err(Error::InvalidParameter("from or to".to_string())),
        };
        let cost_type = check_type(&self.cost_type, schema)?;
        let avoid = check_avoid(&self.avoid, schema)?;
        let values = self
            .values
            .as_ref()
            .ok_or_else(|| Error::MissingParameter("values".to_string()))?
            .parse()?;

        Ok(IsocurveQuery {
            origin,
            direction,
            cost_type,
            avoid,
            values,
        })
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, Error> {
    value
        .as_deref()
        .ok_or_else(|| Error::MissingParameter(name.to_string()))
}

/// Parses `"lat,lon"` into a lon/lat point
pub fn parse_point(value: &str, name: &str) -> Result<Point<f64>, Error> {
    let parts: Vec<&str> = value.split(',').collect();
    if parts.len() != 2 {
        return Err(Error::InvalidParameter(format!("{name} is not a 2D point")));
    }

    let lat = parts[0]
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|lat| (-90.0..=90.0).contains(lat))
        .ok_or_else(|| {
            Error::InvalidParameter(format!(
                "{name} has an invalid latitude, expected a number in [-90,90]"
            ))
        })?;
    let lon = parts[1]
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|lon| (-180.0..=180.0).contains(lon))
        .ok_or_else(|| {
            Error::InvalidParameter(format!(
                "{name} has an invalid longitude, expected a number in [-180,180]"
            ))
        })?;

    Ok(Point::new(lon, lat))
}

fn check_type(value: &Option<String>, schema: &SchemaInfo) -> Result<String, Error> {
    let cost_type = required(value, "type")?;
    if !schema.has_type(cost_type) {
        return Err(Error::InvalidParameter(format!(
            "type must be in [{}]",
            schema.types.join(",")
        )));
    }
    Ok(cost_type.to_string())
}

fn check_avoid(value: &Option<ListParam>, schema: &SchemaInfo) -> Result<Vec<String>, Error> {
    let Some(avoid) = value else {
        return Ok(Vec::new());
    };
    let filters = avoid.items();
    if filters.iter().any(|filter| !schema.has_filter(filter)) {
        return Err(Error::InvalidParameter(format!(
            "avoid must be in [{}]",
            schema.filters.join(",")
        )));
    }
    Ok(filters)
}
