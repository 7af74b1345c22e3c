//! Unit tests for the MongoDB driver

use super::*;
use bson::oid::ObjectId;
use bson::{Bson, doc};
use drivermatrix_core::{DocumentDriver, HarnessConfig, HarnessError};
use serde_json::json;
use std::time::Duration;

fn object(value: serde_json::Value) -> drivermatrix_core::Document {
    value.as_object().cloned().unwrap()
}

mod driver_metadata_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mongodb_driver_name() {
        let driver = MongoDbDriver::new();
        assert_eq!(driver.name(), "mongodb");
        assert_eq!(driver.display_name(), "MongoDB");
    }
}

mod client_options_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_timeouts_follow_config() {
        let config = HarnessConfig::new("mongodb://localhost:27017")
            .with_connect_timeout(Duration::from_millis(1500));
        let options = client_options(&config).await.unwrap();

        assert_eq!(options.server_selection_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(options.connect_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(options.app_name.as_deref(), Some(APP_NAME));
    }

    #[tokio::test]
    async fn test_app_name_from_url_is_kept() {
        let config = HarnessConfig::new("mongodb://localhost:27017/?appName=custom");
        let options = client_options(&config).await.unwrap();
        assert_eq!(options.app_name.as_deref(), Some("custom"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_configuration_error() {
        let config = HarnessConfig::new("http://localhost:27017");
        let err = client_options(&config).await.unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_connect_does_not_touch_network() {
        let config = HarnessConfig::new("mongodb://127.0.0.1:1")
            .with_database("compat")
            .with_connect_timeout(Duration::from_millis(100));
        let session = MongoDbDriver::new().connect(&config).await.unwrap();

        assert_eq!(session.driver_name(), "mongodb");
        assert_eq!(session.database(), "compat");
        assert!(!session.is_closed());

        session.close().await.unwrap();
        session.close().await.unwrap();
        assert!(session.is_closed());
        assert!(session.ping().await.is_err());
    }
}

mod conversion_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_integers_become_int32() {
        let converted = to_bson_document(object(json!({"name": "Alice", "age": 30}))).unwrap();
        assert_eq!(converted, doc! { "name": "Alice", "age": 30_i32 });
    }

    #[test]
    fn test_update_operators_survive() {
        let converted = to_bson_document(object(json!({"$set": {"age": 31}}))).unwrap();
        assert_eq!(converted, doc! { "$set": { "age": 31_i32 } });
    }

    #[test]
    fn test_object_id_renders_as_extended_json() {
        let oid = ObjectId::parse_str("65f0c0ffee00000000000001").unwrap();
        let back = from_bson_document(doc! { "_id": oid, "age": 30_i32 });

        assert_eq!(
            serde_json::Value::Object(back),
            json!({"_id": {"$oid": "65f0c0ffee00000000000001"}, "age": 30})
        );
    }

    #[test]
    fn test_inserted_id_rendering() {
        let oid = ObjectId::parse_str("65f0c0ffee00000000000001").unwrap();
        assert_eq!(
            id_to_string(&Bson::ObjectId(oid)).as_deref(),
            Some("65f0c0ffee00000000000001")
        );
        assert_eq!(id_to_string(&Bson::String("alice".into())).as_deref(), Some("alice"));
        assert_eq!(id_to_string(&Bson::Int32(7)).as_deref(), Some("7"));
        assert_eq!(id_to_string(&Bson::Null), None);
    }
}
