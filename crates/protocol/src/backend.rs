//! Wire contract of the polygon store.
//!
//! Every mutation is a JSON `POST`. The store answers `{"message": ..}` on
//! success and `{"error": ..}` on failure, but success is decided by the HTTP
//! status alone; the body only supplies the operator-facing text.

use formats::{Feature, FeatureCollection, FeatureId, PolygonGeometry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Edit,
    Delete,
    Recolor,
}

impl MutationKind {
    /// Path relative to the backend base URL.
    pub fn path(self) -> &'static str {
        match self {
            MutationKind::Create => "/polygons",
            MutationKind::Edit => "/polygons/edit",
            MutationKind::Delete => "/polygons/delete",
            MutationKind::Recolor => "/polygons/editColor",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MutationKind::Create => "create",
            MutationKind::Edit => "edit",
            MutationKind::Delete => "delete",
            MutationKind::Recolor => "recolor",
        };
        f.write_str(s)
    }
}

/// A validated mutation, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create {
        features: Vec<Feature>,
    },
    Edit {
        id: FeatureId,
        geometry: PolygonGeometry,
        properties: Map<String, Value>,
    },
    Delete {
        id: FeatureId,
    },
    Recolor {
        id: FeatureId,
        color: String,
    },
}

#[derive(Debug, Serialize)]
struct CreateBody {
    geojson: Value,
}

#[derive(Debug, Serialize)]
struct EditBody {
    geojson: Value,
    id: Value,
}

#[derive(Debug, Serialize)]
struct DeleteBody {
    id: Value,
}

#[derive(Debug, Serialize)]
struct RecolorBody<'a> {
    id: Value,
    color: &'a str,
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Create { .. } => MutationKind::Create,
            Mutation::Edit { .. } => MutationKind::Edit,
            Mutation::Delete { .. } => MutationKind::Delete,
            Mutation::Recolor { .. } => MutationKind::Recolor,
        }
    }

    /// Target feature; `None` for creates.
    pub fn target(&self) -> Option<&FeatureId> {
        match self {
            Mutation::Create { .. } => None,
            Mutation::Edit { id, .. } | Mutation::Delete { id } | Mutation::Recolor { id, .. } => {
                Some(id)
            }
        }
    }

    pub fn body(&self) -> Result<Value, serde_json::Error> {
        match self {
            Mutation::Create { features } => serde_json::to_value(CreateBody {
                geojson: FeatureCollection::new(features.clone()).to_geojson_value(),
            }),
            Mutation::Edit {
                id,
                geometry,
                properties,
            } => {
                let feature = Feature {
                    id: Some(id.clone()),
                    geometry: geometry.clone(),
                    properties: properties.clone(),
                };
                serde_json::to_value(EditBody {
                    geojson: FeatureCollection::new(vec![feature]).to_geojson_value(),
                    id: id.to_value(),
                })
            }
            Mutation::Delete { id } => serde_json::to_value(DeleteBody { id: id.to_value() }),
            Mutation::Recolor { id, color } => serde_json::to_value(RecolorBody {
                id: id.to_value(),
                color,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Why the store did not accept a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Non-success status; carries the store's `error` text when present.
    Status { status: u16, error: Option<String> },
    /// Success status with a body that is not a reply object.
    Malformed { status: u16, detail: String },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Status {
                status,
                error: Some(error),
            } => write!(f, "store rejected request ({status}): {error}"),
            RejectReason::Status { status, error: None } => {
                write!(f, "store rejected request ({status})")
            }
            RejectReason::Malformed { status, detail } => {
                write!(f, "malformed store reply ({status}): {detail}")
            }
        }
    }
}

/// Interprets a store reply. The status decides the outcome; the body is only
/// mined for text, except that a success must carry a well-formed reply.
pub fn interpret_reply(status: u16, body: &str) -> Result<String, RejectReason> {
    let success = (200..300).contains(&status);
    let parsed = serde_json::from_str::<BackendReply>(body);

    if !success {
        let error = parsed.ok().and_then(|r| r.error.or(r.message));
        return Err(RejectReason::Status { status, error });
    }

    match parsed {
        Ok(reply) => Ok(reply.message.unwrap_or_default()),
        Err(e) => Err(RejectReason::Malformed {
            status,
            detail: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{Mutation, MutationKind, RejectReason, interpret_reply};
    use formats::{Feature, FeatureId, PolygonGeometry};
    use foundation::MapPoint;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    fn triangle() -> PolygonGeometry {
        PolygonGeometry::from_exterior(vec![
            MapPoint::new(0.0, 0.0),
            MapPoint::new(2.0, 0.0),
            MapPoint::new(0.0, 2.0),
        ])
    }

    #[test]
    fn paths_match_the_store_routes() {
        assert_eq!(MutationKind::Create.path(), "/polygons");
        assert_eq!(MutationKind::Edit.path(), "/polygons/edit");
        assert_eq!(MutationKind::Delete.path(), "/polygons/delete");
        assert_eq!(MutationKind::Recolor.path(), "/polygons/editColor");
    }

    #[test]
    fn create_body_wraps_a_feature_collection() {
        let mut f = Feature::draft(triangle());
        f.set_color("yellow");
        let body = Mutation::Create { features: vec![f] }.body().expect("body");
        assert_eq!(body["geojson"]["type"], json!("FeatureCollection"));
        assert_eq!(
            body["geojson"]["features"][0]["properties"],
            json!({ "color": "yellow" })
        );
        assert!(body.get("id").is_none());
    }

    #[test]
    fn edit_body_carries_id_twice() {
        let m = Mutation::Edit {
            id: FeatureId::from("imunim.3"),
            geometry: triangle(),
            properties: Map::new(),
        };
        let body = m.body().expect("body");
        assert_eq!(body["id"], json!("imunim.3"));
        assert_eq!(body["geojson"]["features"][0]["id"], json!("imunim.3"));
        assert_eq!(
            body["geojson"]["features"][0]["geometry"]["coordinates"][0]
                .as_array()
                .map(Vec::len),
            Some(4)
        );
    }

    #[test]
    fn delete_and_recolor_bodies() {
        let del = Mutation::Delete {
            id: FeatureId::from(7),
        };
        assert_eq!(del.body().expect("body"), json!({ "id": 7 }));
        assert_eq!(del.target(), Some(&FeatureId::from(7)));

        let rec = Mutation::Recolor {
            id: FeatureId::from("imunim.1"),
            color: "black".to_string(),
        };
        assert_eq!(
            rec.body().expect("body"),
            json!({ "id": "imunim.1", "color": "black" })
        );
        assert_eq!(rec.kind(), MutationKind::Recolor);
    }

    #[test]
    fn status_decides_outcome() {
        assert_eq!(
            interpret_reply(200, r#"{"message":"Polygon saved"}"#),
            Ok("Polygon saved".to_string())
        );
        // An error payload under a success status is still a success.
        assert_eq!(interpret_reply(201, r#"{"error":"ignored"}"#), Ok(String::new()));
        assert_eq!(
            interpret_reply(500, r#"{"message":"looks fine"}"#),
            Err(RejectReason::Status {
                status: 500,
                error: Some("looks fine".to_string())
            })
        );
        assert_eq!(
            interpret_reply(404, "<html>nope</html>"),
            Err(RejectReason::Status {
                status: 404,
                error: None
            })
        );
        assert!(matches!(
            interpret_reply(200, "not json"),
            Err(RejectReason::Malformed { status: 200, .. })
        ));
    }
}
