use joinecogrow::db::Database;
use joinecogrow::models::*;
use joinecogrow::store::{Store, StoreError};
use speculate2::speculate;
use uuid::Uuid;

fn create_test_feature(db: &Database, name: &str, category: FeatureCategory) -> Feature {
    db.create_feature(CreateFeatureInput::new(
        name,
        category,
        format!("{name} for growers"),
    ))
    .expect("Failed to create feature")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "features" {
        describe "create_feature" {
            it "defaults is_active to true when omitted" {
                let feature = db.create_feature(CreateFeatureInput::new(
                    "Tree Tracker",
                    FeatureCategory::Trees,
                    "Track planted trees",
                )).expect("Failed to create feature");

                assert_eq!(feature.name, "Tree Tracker");
                assert_eq!(feature.category, FeatureCategory::Trees);
                assert!(feature.is_active);
                assert!(feature.component_id.is_none());
            }

            it "keeps an explicit inactive flag" {
                let mut input = CreateFeatureInput::new("Old Forum", FeatureCategory::Community, "Retired");
                input.is_active = Some(false);

                let feature = db.create_feature(input).expect("Failed to create feature");
                assert!(!feature.is_active);
            }

            it "rejects missing fields without persisting" {
                let input = CreateFeatureInput {
                    name: Some("No Category".to_string()),
                    description: Some("Missing its category".to_string()),
                    ..CreateFeatureInput::default()
                };

                let err = db.create_feature(input).unwrap_err();
                assert!(matches!(err, StoreError::Validation(ValidationError::MissingFields)));
                assert_eq!(db.feature_stats().expect("Query failed").total_features, 0);
            }

            it "rejects unknown categories" {
                let input = CreateFeatureInput {
                    name: Some("Rocket".to_string()),
                    category: Some("space".to_string()),
                    description: Some("Not a category".to_string()),
                    ..CreateFeatureInput::default()
                };

                let err = db.create_feature(input).unwrap_err();
                assert!(matches!(err, StoreError::Validation(ValidationError::UnknownCategory(_))));
            }
        }

        describe "get_feature" {
            it "returns None for non-existent feature" {
                let result = db.get_feature(Uuid::new_v4()).expect("Query failed");
                assert!(result.is_none());
            }

            it "returns the feature by id" {
                let created = create_test_feature(&db, "Compost Guide", FeatureCategory::Diy);

                let found = db.get_feature(created.id).expect("Query failed").expect("Missing feature");
                assert_eq!(found.name, "Compost Guide");
                assert_eq!(found.category, FeatureCategory::Diy);
            }
        }

        describe "list_features" {
            it "returns newest first with the total count" {
                create_test_feature(&db, "First", FeatureCategory::Ai);
                create_test_feature(&db, "Second", FeatureCategory::Ai);
                create_test_feature(&db, "Third", FeatureCategory::Iot);

                let page = db.list_features(1, 10).expect("Query failed");
                let names: Vec<_> = page.data.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["Third", "Second", "First"]);
                assert_eq!(page.count, 3);
            }

            it "pages through results" {
                for name in ["A", "B", "C", "D", "E"] {
                    create_test_feature(&db, name, FeatureCategory::Gaming);
                }

                let page = db.list_features(2, 2).expect("Query failed");
                let names: Vec<_> = page.data.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["C", "B"]);
                assert_eq!(page.count, 5);
            }

            it "includes inactive features" {
                let feature = create_test_feature(&db, "Hidden", FeatureCategory::Admin);
                db.soft_delete_feature(feature.id).expect("Failed to delete");

                let page = db.list_features(1, 10).expect("Query failed");
                assert_eq!(page.data.len(), 1);
                assert!(!page.data[0].is_active);
            }

            it "treats page zero as the first page" {
                create_test_feature(&db, "Only", FeatureCategory::Commerce);

                let page = db.list_features(0, 10).expect("Query failed");
                assert_eq!(page.data.len(), 1);
            }
        }

        describe "features_by_category" {
            it "returns only active features in the category ordered by name" {
                create_test_feature(&db, "Seed Swap", FeatureCategory::Community);
                create_test_feature(&db, "Garden Clubs", FeatureCategory::Community);
                create_test_feature(&db, "Soil Sensor", FeatureCategory::Iot);
                let retired = create_test_feature(&db, "Allotments", FeatureCategory::Community);
                db.soft_delete_feature(retired.id).expect("Failed to delete");

                let features = db.features_by_category(FeatureCategory::Community).expect("Query failed");
                let names: Vec<_> = features.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["Garden Clubs", "Seed Swap"]);
            }
        }

        describe "search_features" {
            it "matches name or description case-insensitively among active features" {
                db.create_feature(CreateFeatureInput::new(
                    "Tree Map",
                    FeatureCategory::Trees,
                    "Find planting sites",
                )).expect("Failed to create");
                db.create_feature(CreateFeatureInput::new(
                    "Carbon Ledger",
                    FeatureCategory::Blockchain,
                    "Offsets from every TREE planted",
                )).expect("Failed to create");
                db.create_feature(CreateFeatureInput::new(
                    "Leaderboard",
                    FeatureCategory::Gaming,
                    "Weekly rankings",
                )).expect("Failed to create");
                let retired = db.create_feature(CreateFeatureInput::new(
                    "Old Tree Census",
                    FeatureCategory::Analytics,
                    "Replaced",
                )).expect("Failed to create");
                db.soft_delete_feature(retired.id).expect("Failed to delete");

                let features = db.search_features("tree").expect("Query failed");
                let names: Vec<_> = features.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["Carbon Ledger", "Tree Map"]);
            }

            it "folds case beyond ASCII" {
                db.create_feature(CreateFeatureInput::new(
                    "ÁRBOL Planner",
                    FeatureCategory::Trees,
                    "Plan community plantings",
                )).expect("Failed to create");
                db.create_feature(CreateFeatureInput::new(
                    "Huerto Urbano",
                    FeatureCategory::Community,
                    "Cada ÁRBOL cuenta",
                )).expect("Failed to create");

                let features = db.search_features("árbol").expect("Query failed");
                let names: Vec<_> = features.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["Huerto Urbano", "ÁRBOL Planner"]);
            }

            it "treats wildcards literally" {
                create_test_feature(&db, "Growth Tracker", FeatureCategory::Analytics);

                assert!(db.search_features("%").expect("Query failed").is_empty());
                assert!(db.search_features("_").expect("Query failed").is_empty());
            }
        }

        describe "update_feature" {
            it "updates only the given fields" {
                let feature = create_test_feature(&db, "Draft", FeatureCategory::Ai);

                let updated = db.update_feature(feature.id, UpdateFeatureInput {
                    name: Some("Plant Doctor".to_string()),
                    ..UpdateFeatureInput::default()
                }).expect("Failed to update");

                assert_eq!(updated.name, "Plant Doctor");
                assert_eq!(updated.description, feature.description);
                assert_eq!(updated.category, FeatureCategory::Ai);
                assert!(updated.updated_at >= feature.updated_at);
            }

            it "rejects a blank name" {
                let feature = create_test_feature(&db, "Draft", FeatureCategory::Ai);

                let err = db.update_feature(feature.id, UpdateFeatureInput {
                    name: Some("   ".to_string()),
                    ..UpdateFeatureInput::default()
                }).unwrap_err();
                assert!(matches!(err, StoreError::Validation(_)));
            }

            it "reports missing features" {
                let err = db.update_feature(Uuid::new_v4(), UpdateFeatureInput::default()).unwrap_err();
                assert!(matches!(err, StoreError::NotFound { entity: "Feature", .. }));
            }
        }

        describe "soft_delete_feature" {
            it "clears is_active and keeps the row" {
                let feature = create_test_feature(&db, "Rain Barrels", FeatureCategory::Diy);

                let deleted = db.soft_delete_feature(feature.id).expect("Failed to delete");
                assert!(!deleted.is_active);
                assert!(db.get_feature(feature.id).expect("Query failed").is_some());
            }

            it "is idempotent" {
                let feature = create_test_feature(&db, "Rain Barrels", FeatureCategory::Diy);

                db.soft_delete_feature(feature.id).expect("Failed to delete");
                let again = db.soft_delete_feature(feature.id).expect("Second delete failed");
                assert!(!again.is_active);
            }

            it "reports missing features" {
                let err = db.soft_delete_feature(Uuid::new_v4()).unwrap_err();
                assert!(matches!(err, StoreError::NotFound { .. }));
            }
        }

        describe "feature_stats" {
            it "returns zeros for an empty catalog" {
                assert_eq!(db.feature_stats().expect("Query failed"), FeatureStats::default());
            }

            it "counts active features and their distinct categories" {
                create_test_feature(&db, "A", FeatureCategory::Trees);
                create_test_feature(&db, "B", FeatureCategory::Trees);
                create_test_feature(&db, "C", FeatureCategory::Ai);
                let retired = create_test_feature(&db, "D", FeatureCategory::Gaming);
                db.soft_delete_feature(retired.id).expect("Failed to delete");

                let stats = db.feature_stats().expect("Query failed");
                assert_eq!(stats.total_features, 4);
                assert_eq!(stats.active_features, 3);
                assert_eq!(stats.categories, 2);
            }
        }
    }

    describe "components" {
        it "stores a generated component" {
            let component = db
                .create_component(CreateComponentInput::generated("CounterComponent", "export default function CounterComponent() {}"))
                .expect("Failed to create component");

            assert!(component.created_by_generator);
            assert!(component.refined_code.is_none());

            let found = db.get_component(component.id).expect("Query failed").expect("Missing component");
            assert_eq!(found.name, "CounterComponent");
        }

        it "sets refined code once generated" {
            let component = db
                .create_component(CreateComponentInput::generated("Toggle", "raw"))
                .expect("Failed to create component");

            let refined = db.set_refined_code(component.id, "refined").expect("Failed to refine");
            assert_eq!(refined.refined_code.as_deref(), Some("refined"));
            assert_eq!(refined.code, "raw");
        }

        it "reports missing components when refining" {
            let err = db.set_refined_code(Uuid::new_v4(), "refined").unwrap_err();
            assert!(matches!(err, StoreError::NotFound { entity: "Component", .. }));
        }

        it "lists features linked to a component, active or not" {
            let component = db
                .create_component(CreateComponentInput::generated("Toggle", "raw"))
                .expect("Failed to create component");

            let mut linked = CreateFeatureInput::new("Dark Mode", FeatureCategory::Admin, "Theme switch");
            linked.component_id = Some(component.id);
            let linked = db.create_feature(linked).expect("Failed to create");
            db.soft_delete_feature(linked.id).expect("Failed to delete");
            create_test_feature(&db, "Unlinked", FeatureCategory::Admin);

            let features = db.features_for_component(component.id).expect("Query failed");
            assert_eq!(features.len(), 1);
            assert_eq!(features[0].name, "Dark Mode");
        }
    }
}
