use std::collections::HashSet;

use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub color: Option<String>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            name: user.name.unwrap_or_default(),
            color: user.color.unwrap_or_default(),
        }
    }
}

/// Width of the map canvas; the height is half of it.
pub const MAP_WIDTH: f64 = 720.0;

#[derive(Debug, sqlx::FromRow, Clone, PartialEq)]
pub struct CountryPosition {
    pub code: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A country drawn on the map, projected equirectangularly onto the canvas.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct MapPoint {
    pub code: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub visited: bool,
}

impl MapPoint {
    pub fn project(position: CountryPosition, visited: bool) -> Self {
        let scale = MAP_WIDTH / 360.0;

        Self {
            x: round_tenth((position.longitude + 180.0) * scale),
            y: round_tenth((90.0 - position.latitude) * scale),
            code: position.code,
            name: position.name,
            visited,
        }
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Everything the `index` template needs to draw one user's map.
#[derive(Serialize)]
pub struct Dashboard {
    pub countries: Vec<String>,
    pub total: usize,
    pub users: Vec<User>,
    pub current_user_id: i64,
    pub color: String,
    pub map: Vec<MapPoint>,
    pub error: Option<String>,
}

impl Dashboard {
    pub fn new(
        current: &User,
        countries: Vec<String>,
        users: Vec<User>,
        positions: Vec<CountryPosition>,
        error: Option<&str>,
    ) -> Self {
        let visited: HashSet<&str> = countries.iter().map(String::as_str).collect();
        let map = positions
            .into_iter()
            .map(|position| {
                let is_visited = visited.contains(position.code.as_str());
                MapPoint::project(position, is_visited)
            })
            .collect();

        Self {
            total: countries.len(),
            countries,
            users,
            current_user_id: current.id,
            color: current.color.clone(),
            map,
            error: error.map(String::from),
        }
    }
}
