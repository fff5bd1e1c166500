//! Demo data for `--demo` mode: a few rows per collection and three accounts
//! (one per role). Dates are computed from today so "upcoming" and "open"
//! listings always have something to show.

use chrono::{Duration, NaiveDate, Utc};
use serde_json::{Value, json};

use crate::backend::{MemoryStore, Record};

pub const DEMO_EMAIL: &str = "admin@ministere.gov";
pub const DEMO_PASSWORD: &str = "demo";

fn row(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

fn day(today: NaiveDate, offset: i64) -> String {
    (today + Duration::days(offset)).format("%Y-%m-%d").to_string()
}

fn stamp(today: NaiveDate, offset: i64) -> String {
    format!("{}T09:00:00+00:00", day(today, offset))
}

pub fn populate(store: &MemoryStore) {
    populate_at(store, Utc::now().date_naive());
}

pub fn populate_at(store: &MemoryStore, today: NaiveDate) {
    let d = |offset| day(today, offset);
    let t = |offset| stamp(today, offset);

    store.add_account("u-admin", DEMO_EMAIL, DEMO_PASSWORD);
    store.add_account("u-editor", "editeur@ministere.gov", DEMO_PASSWORD);
    store.add_account("u-viewer", "lecteur@ministere.gov", DEMO_PASSWORD);
    store.seed(
        "users",
        vec![
            row(json!({"id": "u-admin", "full_name": "Salma Bennani", "email": DEMO_EMAIL, "role": "admin", "department": "Communication", "is_active": true, "created_at": t(-300)})),
            row(json!({"id": "u-editor", "full_name": "Youssef Alaoui", "email": "editeur@ministere.gov", "role": "editor", "department": "Communication", "is_active": true, "created_at": t(-200)})),
            row(json!({"id": "u-viewer", "full_name": "Nadia Tazi", "email": "lecteur@ministere.gov", "role": "viewer", "department": "Logistique", "is_active": false, "created_at": t(-100)})),
        ],
    );

    store.seed(
        "news",
        vec![
            row(json!({"id": "news-1", "title": "Lancement du programme national des routes rurales", "excerpt": "Un programme de désenclavement pour 1 200 douars.", "content": "<p>Le ministère lance un <strong>programme</strong> de routes rurales.</p>", "category": "actualite", "status": "published", "published_at": t(-2), "tags": ["routes", "rural"], "created_at": t(-3)})),
            row(json!({"id": "news-2", "title": "Inauguration du nouveau port de Nador West Med", "excerpt": "Le port entre en service.", "content": "<p>Inauguration officielle du port.</p>", "category": "communique", "status": "published", "published_at": t(-10), "tags": ["port"], "created_at": t(-11)})),
            row(json!({"id": "news-3", "title": "Discours du ministre sur la logistique verte", "excerpt": "Priorité à la décarbonation du transport.", "content": "<p>Discours intégral.</p>", "category": "discours", "status": "published", "published_at": t(-25), "created_at": t(-25)})),
            row(json!({"id": "news-4", "title": "Projet de réforme du transport routier", "excerpt": "Brouillon en cours de relecture.", "content": "<p>À relire.</p>", "category": "actualite", "status": "draft", "created_at": t(-1)})),
            row(json!({"id": "news-5", "title": "Bilan 2022 des chantiers portuaires", "excerpt": "Archive.", "content": "<p>Bilan.</p>", "category": "communique", "status": "archived", "published_at": t(-400), "created_at": t(-400)})),
        ],
    );

    store.seed(
        "projects",
        vec![
            row(json!({"id": "proj-1", "title": "Autoroute continentale Tiznit-Dakhla", "description": "Voie express de 1 055 km.", "region": "Souss-Massa", "budget": 10_000_000_000_i64, "status": "in_progress", "progress": 65, "start_date": d(-900), "end_date": d(400), "created_at": t(-900)})),
            row(json!({"id": "proj-2", "title": "Port Dakhla Atlantique", "description": "Nouveau port en eau profonde.", "region": "Dakhla-Oued Ed-Dahab", "budget": 12_400_000_000_i64, "status": "in_progress", "progress": 30, "start_date": d(-600), "created_at": t(-600)})),
            row(json!({"id": "proj-3", "title": "Rocade méditerranéenne", "description": "Modernisation de la route côtière.", "region": "Oriental", "budget": 2_500_000_000_i64, "status": "completed", "progress": 100, "start_date": d(-2000), "end_date": d(-100), "created_at": t(-2000)})),
            row(json!({"id": "proj-4", "title": "Plateforme logistique de Zenata", "description": "Zone logistique multimodale.", "region": "Casablanca-Settat", "status": "planned", "start_date": d(120), "created_at": t(-20)})),
        ],
    );

    store.seed(
        "tenders",
        vec![
            row(json!({"id": "ao-1", "reference": "AO-2024-017", "title": "Études géotechniques pour ouvrages d'art", "description": "Études préalables.", "budget": 3_500_000, "deadline": d(21), "status": "open", "created_at": t(-7)})),
            row(json!({"id": "ao-2", "reference": "AO-2024-018", "title": "Signalisation horizontale des routes nationales", "budget": 8_200_000, "deadline": d(9), "status": "open", "created_at": t(-5)})),
            row(json!({"id": "ao-3", "reference": "AO-2023-102", "title": "Entretien des chaussées", "budget": 15_000_000, "deadline": d(-60), "status": "awarded", "created_at": t(-120)})),
        ],
    );

    store.seed(
        "careers",
        vec![
            row(json!({"id": "job-1", "title": "Ingénieur d'État en génie civil", "department": "Direction des routes", "location": "Rabat", "contract_type": "cdi", "description": "Suivi de chantiers routiers.", "deadline": d(30), "status": "open", "created_at": t(-4)})),
            row(json!({"id": "job-2", "title": "Stagiaire data analyst", "department": "Direction de la stratégie", "location": "Rabat", "contract_type": "stage", "description": "Analyse des données de trafic.", "deadline": d(14), "status": "open", "created_at": t(-2)})),
            row(json!({"id": "job-3", "title": "Chef de service logistique", "department": "Logistique", "location": "Casablanca", "contract_type": "cdd", "description": "Poste pourvu.", "deadline": d(-40), "status": "closed", "created_at": t(-90)})),
        ],
    );

    store.seed(
        "events",
        vec![
            row(json!({"id": "evt-1", "title": "Forum national de la logistique", "description": "Deux jours d'échanges.", "location": "Casablanca", "start_date": d(12), "end_date": d(13), "status": "published", "created_at": t(-30)})),
            row(json!({"id": "evt-2", "title": "Journée portes ouvertes des ports", "location": "Tanger", "start_date": d(40), "status": "published", "created_at": t(-15)})),
            row(json!({"id": "evt-3", "title": "Salon des infrastructures 2023", "location": "Marrakech", "start_date": d(-200), "status": "archived", "created_at": t(-260)})),
        ],
    );

    store.seed(
        "publications",
        vec![
            row(json!({"id": "pub-1", "title": "Rapport annuel des infrastructures", "description": "Chiffres clés de l'année.", "category": "rapport", "file_url": "https://ministere.gov/docs/rapport.pdf", "published_at": t(-50), "status": "published", "created_at": t(-50)})),
            row(json!({"id": "pub-2", "title": "Guide de la sécurité routière sur chantier", "category": "guide", "file_url": "https://ministere.gov/docs/guide.pdf", "published_at": t(-80), "status": "published", "created_at": t(-80)})),
            row(json!({"id": "pub-3", "title": "Étude sur le fret ferroviaire", "category": "etude", "file_url": "https://ministere.gov/docs/fret.pdf", "status": "draft", "created_at": t(-6)})),
        ],
    );

    store.seed(
        "partners",
        vec![
            row(json!({"id": "par-1", "name": "Banque mondiale", "partner_type": "international", "website": "https://worldbank.org", "is_active": true, "created_at": t(-700)})),
            row(json!({"id": "par-2", "name": "Agence nationale des ports", "partner_type": "institutional", "website": "https://anp.org.ma", "is_active": true, "created_at": t(-650)})),
        ],
    );

    store.seed(
        "statistics",
        vec![
            row(json!({"id": "st-1", "label": "Routes nationales", "value": 18_000, "unit": "km", "category": "infrastructure", "year": 2023, "created_at": t(-90)})),
            row(json!({"id": "st-2", "label": "Trafic portuaire", "value": 195, "unit": "Mt", "category": "transport", "year": 2023, "created_at": t(-90)})),
        ],
    );

    store.seed(
        "roles",
        vec![
            row(json!({"id": "role-1", "name": "admin", "description": "Accès complet", "permissions": ["*"], "created_at": t(-1000)})),
            row(json!({"id": "role-2", "name": "editor", "description": "Gestion des contenus", "permissions": ["news.write", "events.write"], "created_at": t(-1000)})),
            row(json!({"id": "role-3", "name": "viewer", "description": "Lecture seule", "permissions": ["news.read"], "created_at": t(-1000)})),
        ],
    );

    store.seed(
        "contact_submissions",
        vec![
            row(json!({"id": "msg-1", "name": "Karim El Idrissi", "email": "karim@example.ma", "subject": "Demande de documents", "message": "Bonjour, où trouver le dossier AO-2024-017 ?", "status": "new", "created_at": t(-1)})),
            row(json!({"id": "msg-2", "name": "Sara Lahlou", "email": "sara@example.ma", "subject": "Candidature spontanée", "message": "Veuillez trouver mon CV.", "status": "read", "created_at": t(-8)})),
        ],
    );

    store.seed(
        "search_logs",
        ["port", "routes", "port", "appel d'offres", "port", "routes"]
            .iter()
            .enumerate()
            .map(|(i, q)| row(json!({"id": format!("sl-{i}"), "query": q, "results_count": 3, "created_at": t(-(i as i64))})))
            .collect(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_populate_fills_every_public_collection() {
        let store = MemoryStore::new();
        populate_at(&store, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        for table in ["news", "projects", "tenders", "careers", "events", "publications"] {
            assert!(!store.rows(table).is_empty(), "{table} is empty");
        }
        assert_eq!(store.rows("events")[0]["start_date"], json!("2024-06-13"));
    }
}
