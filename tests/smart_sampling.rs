use rand::rngs::StdRng;
use rand::SeedableRng;
use restgen::catalog::{AuthenticationHeader, AuthenticationInfo};
use restgen::engines::genome::NodeId;
use restgen::{
    ActionCatalog, ApiManifest, HttpVerb, ModelCatalog, SampleType, SamplingConfig, SmartSampler,
    TestSequence,
};

/// Manifest with one endpoint per `(verb, path)` and the given models
fn manifest(endpoints: &[(&str, &str)], models: &str) -> ApiManifest {
    let endpoints: Vec<String> = endpoints
        .iter()
        .map(|(verb, path)| format!(r#"{{ "verb": "{}", "path": "{}" }}"#, verb, path))
        .collect();
    let json = format!(
        r#"{{ "endpoints": [{}], "models": [{}] }}"#,
        endpoints.join(","),
        models
    );
    ApiManifest::from_json(&json).unwrap()
}

fn sampler_with(
    endpoints: &[(&str, &str)],
    models: &str,
    users: Vec<AuthenticationInfo>,
    config: SamplingConfig,
    seed: u64,
) -> SmartSampler {
    let manifest = manifest(endpoints, models);
    let actions = ActionCatalog::from_manifest(&manifest, &config.endpoints_to_skip).unwrap();
    let models = ModelCatalog::from_manifest(&manifest).unwrap();
    SmartSampler::with_rng(actions, models, users, config, StdRng::seed_from_u64(seed)).unwrap()
}

fn sampler(endpoints: &[(&str, &str)], max_sequence_size: usize, seed: u64) -> SmartSampler {
    let config = SamplingConfig {
        max_sequence_size,
        ..Default::default()
    };
    sampler_with(endpoints, "", vec![], config, seed)
}

fn sampler_from_json(json: &str, max_sequence_size: usize, seed: u64) -> SmartSampler {
    let manifest = ApiManifest::from_json(json).unwrap();
    let config = SamplingConfig {
        max_sequence_size,
        ..Default::default()
    };
    SmartSampler::with_rng(
        ActionCatalog::from_manifest(&manifest, &[]).unwrap(),
        ModelCatalog::from_manifest(&manifest).unwrap(),
        vec![],
        config,
        StdRng::seed_from_u64(seed),
    )
    .unwrap()
}

/// Current value of the parameter `name` of `action`
fn param_value(sequence: &TestSequence, action: NodeId, name: &str) -> String {
    let tree = sequence.tree();
    let param = tree
        .children(action)
        .iter()
        .copied()
        .find(|&p| tree.get(p).as_param().map_or(false, |h| h.name == name))
        .unwrap();
    tree.get(tree.children(param)[0]).as_gene().unwrap().raw_value()
}

fn signatures(sequence: &TestSequence) -> Vec<String> {
    sequence
        .actions()
        .iter()
        .map(|&a| sequence.header(a).unwrap().signature())
        .collect()
}

fn all_path_params_frozen(sequence: &TestSequence) -> bool {
    sequence.actions().iter().all(|&a| {
        sequence
            .path_values(a)
            .unwrap()
            .iter()
            .all(|(_, gene)| !gene.mutable)
    })
}

#[test]
fn test_get_on_item_is_preceded_by_its_post() {
    for seed in 0..10 {
        let mut sampler = sampler(&[("POST", "/items"), ("GET", "/items/{id}")], 5, seed);
        let sequence = sampler.sample_from("GET:/items/{id}").unwrap();

        assert_eq!(signatures(&sequence), vec!["POST:/items", "GET:/items/{id}"]);
        assert_eq!(sequence.sample_type(), SampleType::Smart);

        let post = sequence.header(sequence.action_at(0).unwrap()).unwrap();
        let get = sequence.header(sequence.action_at(1).unwrap()).unwrap();
        assert!(post.save_location);
        assert_eq!(get.location_id.as_deref(), Some("items"));
        assert!(all_path_params_frozen(&sequence));
        assert!(!sequence.path_values(sequence.action_at(1).unwrap()).unwrap().is_empty());
    }
}

#[test]
fn test_collection_get_gets_several_posts() {
    let mut sampler = sampler(&[("POST", "/items"), ("GET", "/items")], 5, 11);
    let mut lengths = std::collections::BTreeSet::new();

    for _ in 0..200 {
        let sequence = sampler.sample_from("GET:/items").unwrap();
        assert_eq!(sequence.sample_type(), SampleType::SmartGetCollection);
        assert!((3..=5).contains(&sequence.len()), "length {}", sequence.len());
        lengths.insert(sequence.len());

        let names = signatures(&sequence);
        let (get, posts) = names.split_last().unwrap();
        assert_eq!(get, "GET:/items");
        assert!(posts.iter().all(|p| p == "POST:/items"));

        let first = sequence.header(sequence.action_at(0).unwrap()).unwrap().location_id.clone();
        for &post in &sequence.actions()[..posts.len()] {
            assert_eq!(sequence.header(post).unwrap().location_id, first);
        }
    }
    assert_eq!(lengths.into_iter().collect::<Vec<_>>(), vec![3, 4, 5]);
}

#[test]
fn test_collection_get_without_room_stays_smart() {
    let mut sampler = sampler(&[("POST", "/items"), ("GET", "/items")], 2, 3);
    let sequence = sampler.sample_from("GET:/items").unwrap();
    assert_eq!(sequence.len(), 2);
    assert_eq!(sequence.sample_type(), SampleType::Smart);
}

#[test]
fn test_patch_is_repeated_about_half_the_time() {
    let mut sampler = sampler(&[("PATCH", "/items/{id}"), ("POST", "/items")], 5, 23);
    let runs = 400;
    let mut doubled = 0;

    for _ in 0..runs {
        let sequence = sampler.sample_from("PATCH:/items/{id}").unwrap();
        let names = signatures(&sequence);
        assert_eq!(names[0], "POST:/items");
        assert!(all_path_params_frozen(&sequence));

        let patches: Vec<_> = sequence
            .actions()
            .iter()
            .filter(|&&a| sequence.header(a).unwrap().verb == HttpVerb::Patch)
            .collect();
        if patches.len() == 2 {
            doubled += 1;
            let first = sequence.header(*patches[0]).unwrap();
            let second = sequence.header(*patches[1]).unwrap();
            assert_eq!(first.location_id.as_deref(), Some("items"));
            assert_eq!(second.location_id, first.location_id);
            assert_eq!(
                sequence.resolved_path(*patches[0]).unwrap(),
                sequence.resolved_path(*patches[1]).unwrap()
            );
        } else {
            assert_eq!(patches.len(), 1);
        }
    }

    let ratio = doubled as f64 / runs as f64;
    assert!((0.4..=0.6).contains(&ratio), "ratio {}", ratio);
}

#[test]
fn test_patch_is_not_repeated_without_room() {
    let mut sampler = sampler(&[("PATCH", "/items/{id}"), ("POST", "/items")], 2, 5);
    for _ in 0..50 {
        assert_eq!(sampler.sample_from("PATCH:/items/{id}").unwrap().len(), 2);
    }
}

#[test]
fn test_nested_resources_share_identifiers() {
    let endpoints = [
        ("POST", "/shops"),
        ("POST", "/shops/{shopId}/items"),
        ("DELETE", "/shops/{shopId}/items/{itemId}"),
    ];
    let mut sampler = sampler(&endpoints, 5, 8);
    let sequence = sampler.sample_from("DELETE:/shops/{shopId}/items/{itemId}").unwrap();

    assert_eq!(
        signatures(&sequence),
        vec![
            "POST:/shops",
            "POST:/shops/{shopId}/items",
            "DELETE:/shops/{shopId}/items/{itemId}"
        ]
    );
    let shop_id = |node| {
        sequence
            .path_values(node)
            .unwrap()
            .into_iter()
            .find(|(name, _)| name == "shopId")
            .map(|(_, gene)| gene.raw_value())
    };
    let create_item = sequence.action_at(1).unwrap();
    let delete = sequence.action_at(2).unwrap();
    assert_eq!(shop_id(create_item), shop_id(delete));

    assert_eq!(
        sequence.header(create_item).unwrap().location_id.as_deref(),
        Some("shops")
    );
    assert_eq!(sequence.header(delete).unwrap().location_id.as_deref(), Some("items"));
    assert!(all_path_params_frozen(&sequence));
}

#[test]
fn test_sequences_never_exceed_budget() {
    let endpoints = [
        ("POST", "/x"),
        ("POST", "/x/{id}/y"),
        ("GET", "/x/{id}/y"),
        ("GET", "/x"),
        ("PUT", "/x/{id}"),
        ("PATCH", "/x/{id}/y/{yid}"),
        ("DELETE", "/x/{id}"),
    ];
    for max in 1..=6 {
        let config = SamplingConfig {
            max_sequence_size: max,
            prob_of_smart_sampling: 0.8,
            ..Default::default()
        };
        let mut sampler = sampler_with(&endpoints, "", vec![], config, max as u64);
        for _ in 0..150 {
            let sequence = sampler.sample().unwrap();
            assert!(!sequence.is_empty());
            assert!(sequence.len() <= max, "{} actions with budget {}", sequence.len(), max);
        }
    }
}

#[test]
fn test_seed_pool_is_drained_before_anything_else() {
    let users = vec![AuthenticationInfo {
        name: "alice".to_string(),
        headers: vec![AuthenticationHeader {
            name: "Authorization".to_string(),
            value: "Bearer alice".to_string(),
        }],
    }];
    let endpoints = [("POST", "/items"), ("GET", "/items/{id}"), ("DELETE", "/items/{id}")];
    let mut sampler = sampler_with(&endpoints, "", users, SamplingConfig::default(), 2);

    assert_eq!(sampler.pending_seeds(), 6);
    for _ in 0..6 {
        assert!(sampler.has_pending_seed());
        let sequence = sampler.sample().unwrap();
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.sample_type(), SampleType::Smart);
    }
    assert!(!sampler.has_pending_seed());

    sampler.reset_seed_pool().unwrap();
    assert_eq!(sampler.pending_seeds(), 6);
}

#[test]
fn test_parameters_are_bound_from_models() {
    let models = r#"{ "name": "User", "fields": [
        { "name": "id", "gene": { "type": "integer", "min": 1, "max": 9 } },
        { "name": "name", "gene": { "type": "string" } } ] }"#;
    let json = format!(
        r#"{{ "endpoints": [ {{ "verb": "GET", "path": "/users/{{userId}}",
              "parameters": [ {{ "name": "userId", "in": "path",
                  "gene": {{ "type": "integer", "min": 0, "max": 100 }} }} ] }} ],
            "models": [{}] }}"#,
        models
    );
    let manifest = ApiManifest::from_json(&json).unwrap();
    let mut sampler = SmartSampler::with_rng(
        ActionCatalog::from_manifest(&manifest, &[]).unwrap(),
        ModelCatalog::from_manifest(&manifest).unwrap(),
        vec![],
        SamplingConfig::default(),
        StdRng::seed_from_u64(4),
    )
    .unwrap();

    for _ in 0..20 {
        let sequence = sampler.sample_from("GET:/users/{userId}").unwrap();
        let bindings = sequence.bindings().bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!((bindings[0].model.as_str(), bindings[0].field.as_str()), ("User", "id"));
        assert!(sequence.bindings().coherence_check().is_ok());

        let value = sequence.path_values(sequence.action_at(0).unwrap()).unwrap()[0]
            .1
            .raw_value()
            .parse::<i64>()
            .unwrap();
        assert!((1..=9).contains(&value));
    }
}

#[test]
fn test_same_seed_same_sequences() {
    let endpoints = [("POST", "/items"), ("GET", "/items/{id}"), ("GET", "/items")];
    let config = SamplingConfig {
        seed: Some(99),
        ..Default::default()
    };
    let build = || {
        let manifest = manifest(&endpoints, "");
        SmartSampler::new(
            ActionCatalog::from_manifest(&manifest, &[]).unwrap(),
            ModelCatalog::from_manifest(&manifest).unwrap(),
            vec![],
            config.clone(),
        )
        .unwrap()
    };
    let (mut left, mut right) = (build(), build());
    for _ in 0..30 {
        let a = left.sample().unwrap();
        let b = right.sample().unwrap();
        assert_eq!(a.describe().unwrap(), b.describe().unwrap());
        assert_eq!(a.sample_type(), b.sample_type());
    }
}

#[test]
fn test_skipped_endpoints_are_never_sampled() {
    let config = SamplingConfig {
        endpoints_to_skip: vec!["DELETE:/items/{id}".to_string()],
        ..Default::default()
    };
    let endpoints = [("POST", "/items"), ("DELETE", "/items/{id}")];
    let mut sampler = sampler_with(&endpoints, "", vec![], config, 6);
    assert_eq!(sampler.catalog().len(), 1);
    for _ in 0..30 {
        let sequence = sampler.sample().unwrap();
        assert!(signatures(&sequence).iter().all(|s| s == "POST:/items"));
    }
}

#[test]
fn test_put_stands_alone_about_a_fifth_of_the_time() {
    let mut sampler = sampler(&[("POST", "/x"), ("PUT", "/x/{id}")], 5, 31);
    let runs = 500;
    let mut alone = 0;

    for _ in 0..runs {
        let sequence = sampler.sample_from("PUT:/x/{id}").unwrap();
        assert_eq!(sequence.sample_type(), SampleType::Smart);
        if sequence.len() == 1 {
            alone += 1;
            assert_eq!(signatures(&sequence), vec!["PUT:/x/{id}"]);
        } else {
            assert_eq!(signatures(&sequence), vec!["POST:/x", "PUT:/x/{id}"]);
            assert!(all_path_params_frozen(&sequence));
            let put = sequence.header(sequence.action_at(1).unwrap()).unwrap();
            assert_eq!(put.location_id.as_deref(), Some("x"));
        }
    }

    let ratio = alone as f64 / runs as f64;
    assert!((0.13..=0.27).contains(&ratio), "ratio {}", ratio);
}

#[test]
fn test_enum_parameter_ignores_model_enum_with_other_options() {
    let json = r#"{
        "endpoints": [ { "verb": "GET", "path": "/pets", "parameters": [
            { "name": "status", "in": "query",
              "gene": { "type": "enum", "values": ["available", "pending"] } } ] } ],
        "models": [ { "name": "Pet", "fields": [
            { "name": "status", "gene": { "type": "enum", "values": ["new", "sold"] } } ] } ]
    }"#;
    let mut sampler = sampler_from_json(json, 5, 12);

    for _ in 0..20 {
        let sequence = sampler.sample_from("GET:/pets").unwrap();
        assert_eq!(sequence.len(), 1);
        assert!(sequence.bindings().bindings().is_empty());
        let status = param_value(&sequence, sequence.action_at(0).unwrap(), "status");
        assert!(["available", "pending"].contains(&status.as_str()), "status {}", status);
    }
    for _ in 0..20 {
        assert!(sampler.sample().is_ok());
    }
}

#[test]
fn test_enum_and_string_fields_bind_from_one_instance() {
    let json = r#"{
        "endpoints": [ { "verb": "GET", "path": "/pets", "parameters": [
            { "name": "kind", "in": "query",
              "gene": { "type": "enum", "values": ["cat", "dog", "bird"] } },
            { "name": "name", "in": "query", "gene": { "type": "string" } } ] } ],
        "models": [ { "name": "Pet", "fields": [
            { "name": "kind", "gene": { "type": "enum", "values": ["cat", "dog"] } },
            { "name": "name", "gene": { "type": "string", "min_length": 1, "max_length": 12 } } ] } ]
    }"#;
    let mut sampler = sampler_from_json(json, 5, 17);

    for _ in 0..20 {
        let sequence = sampler.sample_from("GET:/pets").unwrap();
        let get = sequence.action_at(0).unwrap();
        let bindings = sequence.bindings().bindings();
        assert_eq!(bindings.len(), 2);
        assert!(sequence.bindings().coherence_check().is_ok());

        let instance = sequence.bindings().instance(bindings[0].instance).unwrap();
        for binding in bindings {
            assert_eq!(binding.model, "Pet");
            assert_eq!(binding.instance, bindings[0].instance);
            let field = instance.field(&binding.field).unwrap().raw_value();
            assert_eq!(param_value(&sequence, get, &binding.parameter), field);
        }
        let kind = param_value(&sequence, get, "kind");
        assert!(["cat", "dog"].contains(&kind.as_str()), "kind {}", kind);
    }
}

#[test]
fn test_undeclared_path_parameter_follows_declared_one() {
    let json = r#"{
        "endpoints": [
            { "verb": "POST", "path": "/pets" },
            { "verb": "POST", "path": "/pets/{petId}/photos" },
            { "verb": "GET", "path": "/pets/{petId}/photos", "parameters": [
                { "name": "petId", "in": "path", "gene": { "type": "integer", "min": 1, "max": 500 } } ] }
        ],
        "models": []
    }"#;
    let mut sampler = sampler_from_json(json, 5, 5);

    for _ in 0..30 {
        let sequence = sampler.sample_from("GET:/pets/{petId}/photos").unwrap();
        let names = signatures(&sequence);
        assert_eq!(names[0], "POST:/pets");
        assert_eq!(names.last().unwrap(), "GET:/pets/{petId}/photos");

        let get = *sequence.actions().last().unwrap();
        let expected = sequence.resolved_path(get).unwrap();
        for &action in &sequence.actions()[1..] {
            assert_eq!(sequence.resolved_path(action).unwrap(), expected);
        }
    }
}

#[test]
fn test_chain_shares_identifiers_across_variable_names() {
    let endpoints = [
        ("POST", "/items"),
        ("POST", "/items/{id}/tags"),
        ("GET", "/items/{itemId}/tags"),
    ];
    let mut sampler = sampler(&endpoints, 5, 3);

    for _ in 0..30 {
        let sequence = sampler.sample_from("GET:/items/{itemId}/tags").unwrap();
        let get = *sequence.actions().last().unwrap();
        let expected = sequence.resolved_path(get).unwrap();
        assert!(!expected.contains('{'));
        for &action in &sequence.actions()[1..] {
            assert_eq!(sequence.resolved_path(action).unwrap(), expected);
        }
        assert!(all_path_params_frozen(&sequence));
    }
}

