#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::backend::{Filter, Query};

    #[test]
    fn test_renders_postgrest_params() {
        let q = Query::new()
            .eq("city", "São Paulo")
            .gte("starts_at", "2030-01-01T00:00:00Z")
            .ilike("title", "%samba%")
            .in_list("id", ["a", "b,c"])
            .contains("categories", ["música"])
            .is_null("deleted_at")
            .order("starts_at", true)
            .order("slug", false)
            .limit(20)
            .offset(40);

        let params = q.to_params();
        let get = |k: &str| {
            params
                .iter()
                .find(|(name, _)| name == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("city"), Some("eq.São Paulo"));
        assert_eq!(get("starts_at"), Some("gte.2030-01-01T00:00:00Z"));
        assert_eq!(get("title"), Some("ilike.*samba*"));
        assert_eq!(get("id"), Some(r#"in.("a","b,c")"#));
        assert_eq!(get("categories"), Some(r#"cs.{"música"}"#));
        assert_eq!(get("deleted_at"), Some("is.null"));
        assert_eq!(get("order"), Some("starts_at.asc,slug.desc"));
        assert_eq!(get("limit"), Some("20"));
        assert_eq!(get("offset"), Some("40"));
    }

    #[test]
    fn test_renders_or_groups_and_encodes() {
        let q = Query::new().or(vec![
            Filter::Eq("venue_id".into(), json!("v1")),
            Filter::Contains("artist_ids".into(), vec![json!("v1")]),
        ]);
        assert_eq!(
            q.to_params(),
            vec![(
                "or".to_string(),
                r#"(venue_id.eq.v1,artist_ids.cs.{"v1"})"#.to_string()
            )]
        );

        let qs = Query::new().eq("city", "São Paulo").to_query_string();
        assert_eq!(qs, "city=eq.S%C3%A3o%20Paulo");
    }

    #[test]
    fn test_matches_rows_in_memory() {
        let row = json!({
            "city": "Recife",
            "price_min": 30,
            "starts_at": "2030-05-01T20:00:00Z",
            "title": "Noite de Frevo",
            "categories": ["frevo", "carnaval"],
            "deleted_at": null
        });

        assert!(Query::new().eq("city", "Recife").matches(&row));
        assert!(!Query::new().neq("city", "Recife").matches(&row));
        assert!(Query::new().gt("price_min", 10).lte("price_min", 30.0).matches(&row));
        assert!(Query::new().ilike("title", "%FREVO%").matches(&row));
        assert!(!Query::new().ilike("title", "frevo").matches(&row));
        assert!(Query::new().contains("categories", ["carnaval"]).matches(&row));
        assert!(!Query::new().contains("categories", ["samba"]).matches(&row));
        assert!(Query::new().is_null("deleted_at").is_null("missing").matches(&row));
        assert!(Query::new().in_list("city", ["Olinda", "Recife"]).matches(&row));
        assert!(Query::new()
            .or(vec![
                Filter::Eq("city".into(), json!("Salvador")),
                Filter::Gte("price_min".into(), json!(30)),
            ])
            .matches(&row));
    }

    #[test]
    fn test_timestamps_compare_as_instants() {
        let row = json!({"starts_at": "2030-05-01T20:00:00.500Z"});
        // Lexicographically ".500Z" < "Z", as instants it is later.
        assert!(Query::new().gt("starts_at", "2030-05-01T20:00:00Z").matches(&row));
        assert!(Query::new().lt("starts_at", "2030-05-01T17:01:00-03:00").matches(&row));
    }

    #[test]
    fn test_apply_orders_nulls_last_and_paginates() {
        let rows = vec![
            json!({"slug": "c", "position": 3}),
            json!({"slug": "n", "position": null}),
            json!({"slug": "a", "position": 1}),
            json!({"slug": "b", "position": 2}),
        ];
        let out = Query::new().order("position", true).offset(1).limit(2).apply(rows);
        let slugs: Vec<&str> = out.iter().map(|r| r["slug"].as_str().unwrap()).collect();
        assert_eq!(slugs, vec!["b", "c"]);
    }
}
