//! 🗺️ Schema Definer: which field is text, which is a keyword, which one is a
//! spot on the map.
//!
//! The mapping is declared once, shipped to the engine once (if the index is
//! new), and never touched again. There is no migration here. There is no
//! diffing against whatever the cluster already holds. If the index exists
//! with a different mapping, we will not notice, and we will not pretend to.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::common::Record;
use crate::errors::SeedError;

/// 🏷️ The closed set of field types the engine knows about (for our purposes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Keyword,
    Integer,
    Float,
    Date,
    GeoPoint,
}

impl FieldType {
    /// The tag as the engine spells it in a mapping.
    pub fn as_tag(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Keyword => "keyword",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Date => "date",
            FieldType::GeoPoint => "geo_point",
        }
    }

    /// 🔍 Does this JSON value have the shape this type promises?
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Text | FieldType::Keyword => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Date => value
                .as_str()
                .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
            FieldType::GeoPoint => is_geo_point(value),
        }
    }
}

// 📍 exactly {lat, lon}, both numbers, both on planet earth
fn is_geo_point(value: &Value) -> bool {
    let Some(point) = value.as_object() else {
        return false;
    };
    let lat = point.get("lat").and_then(Value::as_f64);
    let lon = point.get("lon").and_then(Value::as_f64);
    point.len() == 2
        && lat.is_some_and(|lat| (-90.0..=90.0).contains(&lat))
        && lon.is_some_and(|lon| (-180.0..=180.0).contains(&lon))
}

/// 📜 Field name → type tag, in declaration order. Names are unique and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    fields: Vec<(String, FieldType)>,
}

impl IndexSchema {
    /// 🏗️ Build a schema, refusing blank or duplicated field names.
    pub fn new<N: Into<String>>(
        fields: impl IntoIterator<Item = (N, FieldType)>,
    ) -> Result<Self, SeedError> {
        let mut declared: Vec<(String, FieldType)> = Vec::new();
        for (name, field_type) in fields {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(SeedError::invalid_input("schema field names must not be blank"));
            }
            if declared.iter().any(|(existing, _)| *existing == name) {
                return Err(SeedError::invalid_input(format!(
                    "schema declares field '{name}' more than once"
                )));
            }
            declared.push((name, field_type));
        }
        Ok(Self { fields: declared })
    }

    /// 🎬 The movie schema: seven fields, no geography.
    pub fn movies() -> Self {
        Self::from_static(&movie_fields())
    }

    /// 🌍 The movie schema plus `ciudad` (keyword) and `ubicacion` (geo_point). Nine fields.
    pub fn movies_with_geo() -> Self {
        let mut schema = Self::movies();
        schema.fields.push(("ciudad".to_string(), FieldType::Keyword));
        schema.fields.push(("ubicacion".to_string(), FieldType::GeoPoint));
        schema
    }

    // -- known-good literal lists skip the duplicate check
    fn from_static(fields: &[(&'static str, FieldType)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(name, field_type)| (name.to_string(), *field_type))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, field_type)| *field_type)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// 📡 The create-index body: `{"mappings":{"properties":{name:{"type":tag}}}}`.
    pub fn to_mapping_body(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, field_type)| (name.clone(), json!({ "type": field_type.as_tag() })))
            .collect();
        json!({ "mappings": { "properties": properties } })
    }

    /// ✅ A record conforms when it has exactly the declared fields and every
    /// value has the declared shape. First offender wins the error message.
    pub fn check(&self, record: &Record) -> Result<(), SeedError> {
        for (name, field_type) in &self.fields {
            match record.get(name) {
                None => {
                    return Err(SeedError::invalid_input(format!(
                        "record is missing declared field '{name}'"
                    )));
                }
                Some(value) if !field_type.accepts(value) => {
                    return Err(SeedError::invalid_input(format!(
                        "field '{name}' should be {} but holds {value}",
                        field_type.as_tag()
                    )));
                }
                Some(_) => {}
            }
        }
        if let Some((stray, _)) = record
            .fields()
            .find(|(name, _)| self.field_type(name).is_none())
        {
            return Err(SeedError::invalid_input(format!(
                "record carries undeclared field '{stray}'"
            )));
        }
        Ok(())
    }
}

// -- static field list shared by both movie schemas
fn movie_fields() -> [(&'static str, FieldType); 7] {
    [
        ("titulo", FieldType::Text),
        ("director", FieldType::Keyword),
        ("genero", FieldType::Keyword),
        ("anio", FieldType::Integer),
        ("calificacion", FieldType::Float),
        ("votos", FieldType::Integer),
        ("fecha_ingreso", FieldType::Date),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(fields) => Record::from_map(fields),
            other => panic!("💀 test fixture must be an object, got {other}"),
        }
    }

    fn a_perfectly_boring_movie() -> Value {
        json!({
            "titulo": "Pelicula 1",
            "director": "Ana Martínez",
            "genero": "Drama",
            "anio": 1999,
            "calificacion": 7.5,
            "votos": 420,
            "fecha_ingreso": "2024-05-01T12:00:00Z"
        })
    }

    #[test]
    fn the_one_where_the_mapping_body_speaks_engine() {
        let body = IndexSchema::movies_with_geo().to_mapping_body();
        let properties = &body["mappings"]["properties"];
        assert_eq!(properties["titulo"], json!({"type": "text"}));
        assert_eq!(properties["director"], json!({"type": "keyword"}));
        assert_eq!(properties["anio"], json!({"type": "integer"}));
        assert_eq!(properties["calificacion"], json!({"type": "float"}));
        assert_eq!(properties["fecha_ingreso"], json!({"type": "date"}));
        assert_eq!(properties["ubicacion"], json!({"type": "geo_point"}));
        assert_eq!(properties.as_object().map(|p| p.len()), Some(9));
    }

    #[test]
    fn the_one_where_movie_schemas_have_seven_and_nine_fields() {
        assert_eq!(IndexSchema::movies().len(), 7);
        assert_eq!(IndexSchema::movies_with_geo().len(), 9);
        assert_eq!(
            IndexSchema::movies_with_geo().field_type("ciudad"),
            Some(FieldType::Keyword)
        );
    }

    #[test]
    fn the_one_where_duplicate_field_names_are_turned_away_at_the_door() {
        let twins = IndexSchema::new([("titulo", FieldType::Text), ("titulo", FieldType::Keyword)]);
        assert!(matches!(twins, Err(SeedError::InvalidInput(_))));

        let nameless = IndexSchema::new([(" ", FieldType::Text)]);
        assert!(matches!(nameless, Err(SeedError::InvalidInput(_))));
    }

    #[test]
    fn the_one_where_field_types_serialize_as_engine_tags() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_value(FieldType::GeoPoint)?, json!("geo_point"));
        let parsed: FieldType = serde_json::from_value(json!("keyword"))?;
        assert_eq!(parsed, FieldType::Keyword);
        Ok(())
    }

    #[test]
    fn the_one_where_a_boring_movie_conforms() -> Result<(), SeedError> {
        IndexSchema::movies().check(&record(a_perfectly_boring_movie()))
    }

    #[test]
    fn the_one_where_missing_stray_and_mistyped_fields_all_fail() {
        let schema = IndexSchema::movies();

        let mut missing = a_perfectly_boring_movie();
        if let Some(fields) = missing.as_object_mut() {
            fields.remove("votos");
        }
        assert!(schema.check(&record(missing)).is_err());

        let mut stray = a_perfectly_boring_movie();
        stray["palomitas"] = json!(true);
        assert!(schema.check(&record(stray)).is_err());

        let mut mistyped = a_perfectly_boring_movie();
        mistyped["anio"] = json!("mil novecientos");
        assert!(schema.check(&record(mistyped)).is_err());

        let mut bad_date = a_perfectly_boring_movie();
        bad_date["fecha_ingreso"] = json!("last tuesday");
        assert!(schema.check(&record(bad_date)).is_err());
    }

    #[test]
    fn the_one_where_geo_points_must_be_lat_lon_and_nothing_else() {
        let schema = IndexSchema::movies_with_geo();
        let mut movie = a_perfectly_boring_movie();
        movie["ciudad"] = json!("Madrid");

        movie["ubicacion"] = json!({"lat": 40.4168, "lon": -3.7038});
        assert!(schema.check(&record(movie.clone())).is_ok());

        movie["ubicacion"] = json!({"lat": 40.4168});
        assert!(schema.check(&record(movie.clone())).is_err());

        movie["ubicacion"] = json!({"lat": 123.0, "lon": 0.0});
        assert!(schema.check(&record(movie.clone())).is_err());

        movie["ubicacion"] = json!("40.4168,-3.7038");
        assert!(schema.check(&record(movie)).is_err());
    }
}
