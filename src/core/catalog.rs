//! # Model Catalog
//!
//! One function per admin page, each returning that page's `ModelConfig`.
//! `all()` lists them in menu order. These are plain values; nothing here is
//! shared mutable state.

use crate::backend::SortOrder;
use crate::core::model::{
    BulkAction, Features, FieldConfig, FieldKind, ModelConfig, RowAction, SelectOption,
};

fn publication_status() -> FieldKind {
    FieldKind::Select(vec![
        SelectOption::new("draft", "Brouillon"),
        SelectOption::new("published", "Publié"),
        SelectOption::new("archived", "Archivé"),
    ])
}

fn editorial_features() -> Features {
    Features {
        bulk_actions: true,
        duplicate: true,
        preview: true,
        ..Features::default()
    }
}

fn editorial_actions() -> Vec<RowAction> {
    vec![
        RowAction::Edit,
        RowAction::Preview,
        RowAction::Duplicate,
        RowAction::Publish,
        RowAction::Archive,
        RowAction::Delete,
    ]
}

pub fn news() -> ModelConfig {
    ModelConfig::builder("news")
        .labels("Actualité", "Actualités")
        .field(FieldConfig::new("title", "Titre", FieldKind::Text).required().listed().sortable().searchable())
        .field(FieldConfig::new("excerpt", "Résumé", FieldKind::Textarea).searchable())
        .field(FieldConfig::new("content", "Contenu", FieldKind::RichText).required())
        .field(
            FieldConfig::new(
                "category",
                "Catégorie",
                FieldKind::Select(vec![
                    SelectOption::new("actualite", "Actualité"),
                    SelectOption::new("communique", "Communiqué"),
                    SelectOption::new("discours", "Discours"),
                ]),
            )
            .listed()
            .filterable(),
        )
        .field(FieldConfig::new("status", "Statut", publication_status()).required().listed().filterable().sortable())
        .field(FieldConfig::new("published_at", "Date de publication", FieldKind::Date).listed().sortable())
        .field(FieldConfig::new("image_url", "Image", FieldKind::Url).placeholder("https://"))
        .field(FieldConfig::new("tags", "Mots-clés", FieldKind::Array))
        .field(FieldConfig::new("author_id", "Auteur", FieldKind::Text))
        .default_sort("published_at", SortOrder::Desc)
        .status_field("status")
        .title_field("title")
        .features(Features {
            import: true,
            ..editorial_features()
        })
        .row_actions(editorial_actions())
        .bulk_actions(vec![BulkAction::Publish, BulkAction::Archive, BulkAction::Delete])
        .build()
}

pub fn projects() -> ModelConfig {
    ModelConfig::builder("projects")
        .labels("Projet", "Projets")
        .field(FieldConfig::new("title", "Titre", FieldKind::Text).required().listed().sortable().searchable())
        .field(FieldConfig::new("description", "Description", FieldKind::Textarea).required().searchable())
        .field(FieldConfig::new("region", "Région", FieldKind::Text).listed().filterable().sortable())
        .field(FieldConfig::new("budget", "Budget", FieldKind::Number).listed().sortable())
        .field(
            FieldConfig::new(
                "status",
                "Statut",
                FieldKind::Select(vec![
                    SelectOption::new("planned", "Planifié"),
                    SelectOption::new("in_progress", "En cours"),
                    SelectOption::new("completed", "Achevé"),
                ]),
            )
            .required()
            .listed()
            .filterable(),
        )
        .field(FieldConfig::new("progress", "Avancement (%)", FieldKind::Number))
        .field(FieldConfig::new("start_date", "Début", FieldKind::Date).listed().sortable())
        .field(FieldConfig::new("end_date", "Fin", FieldKind::Date))
        .field(FieldConfig::new("image_url", "Image", FieldKind::Url))
        .default_sort("start_date", SortOrder::Desc)
        .status_field("status")
        .title_field("title")
        .features(Features {
            bulk_actions: true,
            duplicate: true,
            ..Features::default()
        })
        .row_actions(vec![RowAction::Edit, RowAction::Duplicate, RowAction::Delete])
        .bulk_actions(vec![BulkAction::Delete])
        .build()
}

pub fn tenders() -> ModelConfig {
    ModelConfig::builder("tenders")
        .labels("Appel d'offres", "Appels d'offres")
        .field(FieldConfig::new("reference", "Référence", FieldKind::Text).required().listed().searchable())
        .field(FieldConfig::new("title", "Objet", FieldKind::Text).required().listed().sortable().searchable())
        .field(FieldConfig::new("description", "Description", FieldKind::Textarea).searchable())
        .field(FieldConfig::new("budget", "Budget estimatif", FieldKind::Number).listed().sortable())
        .field(FieldConfig::new("deadline", "Date limite", FieldKind::Date).required().listed().sortable())
        .field(
            FieldConfig::new(
                "status",
                "Statut",
                FieldKind::Select(vec![
                    SelectOption::new("open", "Ouvert"),
                    SelectOption::new("closed", "Clôturé"),
                    SelectOption::new("awarded", "Attribué"),
                ]),
            )
            .required()
            .listed()
            .filterable(),
        )
        .field(FieldConfig::new("document_url", "Dossier", FieldKind::Url))
        .default_sort("deadline", SortOrder::Desc)
        .status_field("status")
        .title_field("title")
        .features(Features {
            bulk_actions: true,
            ..Features::default()
        })
        .bulk_actions(vec![BulkAction::Delete])
        .build()
}

pub fn careers() -> ModelConfig {
    ModelConfig::builder("careers")
        .labels("Offre d'emploi", "Carrières")
        .field(FieldConfig::new("title", "Intitulé", FieldKind::Text).required().listed().sortable().searchable())
        .field(FieldConfig::new("department", "Direction", FieldKind::Text).listed().filterable())
        .field(FieldConfig::new("location", "Lieu", FieldKind::Text))
        .field(
            FieldConfig::new(
                "contract_type",
                "Contrat",
                FieldKind::Select(vec![
                    SelectOption::new("cdi", "CDI"),
                    SelectOption::new("cdd", "CDD"),
                    SelectOption::new("stage", "Stage"),
                ]),
            )
            .listed()
            .filterable(),
        )
        .field(FieldConfig::new("description", "Description", FieldKind::Textarea).required().searchable())
        .field(FieldConfig::new("deadline", "Date limite", FieldKind::Date).listed().sortable())
        .field(
            FieldConfig::new(
                "status",
                "Statut",
                FieldKind::Select(vec![
                    SelectOption::new("open", "Ouverte"),
                    SelectOption::new("closed", "Clôturée"),
                ]),
            )
            .listed()
            .filterable(),
        )
        .default_sort("deadline", SortOrder::Desc)
        .status_field("status")
        .title_field("title")
        .features(Features {
            duplicate: true,
            ..Features::default()
        })
        .row_actions(vec![RowAction::Edit, RowAction::Duplicate, RowAction::Delete])
        .build()
}

pub fn events() -> ModelConfig {
    ModelConfig::builder("events")
        .labels("Événement", "Événements")
        .field(FieldConfig::new("title", "Titre", FieldKind::Text).required().listed().sortable().searchable())
        .field(FieldConfig::new("description", "Description", FieldKind::Textarea).searchable())
        .field(FieldConfig::new("location", "Lieu", FieldKind::Text).listed())
        .field(FieldConfig::new("start_date", "Début", FieldKind::Date).required().listed().sortable())
        .field(FieldConfig::new("end_date", "Fin", FieldKind::Date))
        .field(FieldConfig::new("registration_url", "Inscription", FieldKind::Url))
        .field(FieldConfig::new("status", "Statut", publication_status()).listed().filterable())
        .default_sort("start_date", SortOrder::Desc)
        .status_field("status")
        .title_field("title")
        .features(editorial_features())
        .row_actions(editorial_actions())
        .bulk_actions(vec![BulkAction::Publish, BulkAction::Archive, BulkAction::Delete])
        .build()
}

pub fn publications() -> ModelConfig {
    ModelConfig::builder("publications")
        .labels("Publication", "Publications")
        .field(FieldConfig::new("title", "Titre", FieldKind::Text).required().listed().sortable().searchable())
        .field(FieldConfig::new("description", "Description", FieldKind::Textarea).searchable())
        .field(
            FieldConfig::new(
                "category",
                "Catégorie",
                FieldKind::Select(vec![
                    SelectOption::new("rapport", "Rapport"),
                    SelectOption::new("etude", "Étude"),
                    SelectOption::new("guide", "Guide"),
                    SelectOption::new("texte_juridique", "Texte juridique"),
                ]),
            )
            .listed()
            .filterable(),
        )
        .field(FieldConfig::new("file_url", "Fichier", FieldKind::Url).required())
        .field(FieldConfig::new("published_at", "Date", FieldKind::Date).listed().sortable())
        .field(FieldConfig::new("status", "Statut", publication_status()).listed().filterable())
        .default_sort("published_at", SortOrder::Desc)
        .status_field("status")
        .title_field("title")
        .features(editorial_features())
        .row_actions(editorial_actions())
        .bulk_actions(vec![BulkAction::Publish, BulkAction::Archive, BulkAction::Delete])
        .build()
}

pub fn users() -> ModelConfig {
    ModelConfig::builder("users")
        .labels("Utilisateur", "Utilisateurs")
        .field(FieldConfig::new("full_name", "Nom complet", FieldKind::Text).required().listed().sortable().searchable())
        .field(FieldConfig::new("email", "E-mail", FieldKind::Email).required().listed().searchable())
        .field(
            FieldConfig::new(
                "role",
                "Rôle",
                FieldKind::Select(vec![
                    SelectOption::new("admin", "Administrateur"),
                    SelectOption::new("editor", "Éditeur"),
                    SelectOption::new("viewer", "Lecteur"),
                ]),
            )
            .required()
            .listed()
            .filterable(),
        )
        .field(FieldConfig::new("department", "Direction", FieldKind::Text))
        .field(FieldConfig::new("is_active", "Actif", FieldKind::Boolean).listed().filterable())
        .default_sort("full_name", SortOrder::Asc)
        .title_field("full_name")
        .build()
}

pub fn roles() -> ModelConfig {
    ModelConfig::builder("roles")
        .labels("Rôle", "Rôles et permissions")
        .field(FieldConfig::new("name", "Nom", FieldKind::Text).required().listed().sortable().searchable())
        .field(FieldConfig::new("description", "Description", FieldKind::Textarea).listed())
        .field(FieldConfig::new("permissions", "Permissions", FieldKind::Array).listed().placeholder("news.read, news.write"))
        .default_sort("name", SortOrder::Asc)
        .title_field("name")
        .features(Features {
            export: false,
            pagination: false,
            ..Features::default()
        })
        .build()
}

pub fn partners() -> ModelConfig {
    ModelConfig::builder("partners")
        .labels("Partenaire", "Partenaires")
        .field(FieldConfig::new("name", "Nom", FieldKind::Text).required().listed().sortable().searchable())
        .field(
            FieldConfig::new(
                "partner_type",
                "Type",
                FieldKind::Select(vec![
                    SelectOption::new("institutional", "Institutionnel"),
                    SelectOption::new("international", "International"),
                    SelectOption::new("private", "Privé"),
                ]),
            )
            .listed()
            .filterable(),
        )
        .field(FieldConfig::new("website", "Site web", FieldKind::Url).listed())
        .field(FieldConfig::new("logo_url", "Logo", FieldKind::Url))
        .field(FieldConfig::new("is_active", "Actif", FieldKind::Boolean).listed().filterable())
        .default_sort("name", SortOrder::Asc)
        .title_field("name")
        .page_size(20)
        .build()
}

pub fn statistics() -> ModelConfig {
    ModelConfig::builder("statistics")
        .labels("Statistique", "Statistiques")
        .field(FieldConfig::new("label", "Libellé", FieldKind::Text).required().listed().searchable())
        .field(FieldConfig::new("value", "Valeur", FieldKind::Number).required().listed().sortable())
        .field(FieldConfig::new("unit", "Unité", FieldKind::Text).listed())
        .field(
            FieldConfig::new(
                "category",
                "Catégorie",
                FieldKind::Select(vec![
                    SelectOption::new("infrastructure", "Infrastructure"),
                    SelectOption::new("transport", "Transport"),
                    SelectOption::new("logistique", "Logistique"),
                ]),
            )
            .listed()
            .filterable(),
        )
        .field(FieldConfig::new("year", "Année", FieldKind::Number).listed().sortable())
        .default_sort("year", SortOrder::Desc)
        .title_field("label")
        .page_size(20)
        .features(Features {
            import: true,
            ..Features::default()
        })
        .build()
}

pub fn audit_logs() -> ModelConfig {
    ModelConfig::builder("audit_logs")
        .labels("Entrée du journal", "Journal d'audit")
        .field(
            FieldConfig::new(
                "action",
                "Action",
                FieldKind::Select(vec![
                    SelectOption::new("create", "Création"),
                    SelectOption::new("update", "Modification"),
                    SelectOption::new("delete", "Suppression"),
                ]),
            )
            .listed()
            .filterable(),
        )
        .field(FieldConfig::new("table_name", "Collection", FieldKind::Text).listed().filterable().searchable())
        .field(FieldConfig::new("record_id", "Enregistrement", FieldKind::Text).listed().searchable())
        .field(FieldConfig::new("user_id", "Utilisateur", FieldKind::Text).listed())
        .field(FieldConfig::new("created_at", "Date", FieldKind::Date).listed().sortable())
        .default_sort("created_at", SortOrder::Desc)
        .page_size(25)
        .row_actions(Vec::new())
        .build()
}

pub fn forms() -> ModelConfig {
    ModelConfig::builder("forms")
        .table("contact_submissions")
        .labels("Message", "Formulaires de contact")
        .field(FieldConfig::new("name", "Nom", FieldKind::Text).required().listed().searchable())
        .field(FieldConfig::new("email", "E-mail", FieldKind::Email).required().listed().searchable())
        .field(FieldConfig::new("subject", "Objet", FieldKind::Text).required().listed().searchable())
        .field(FieldConfig::new("message", "Message", FieldKind::Textarea).required())
        .field(
            FieldConfig::new(
                "status",
                "Statut",
                FieldKind::Select(vec![
                    SelectOption::new("new", "Nouveau"),
                    SelectOption::new("read", "Lu"),
                    SelectOption::new("archived", "Archivé"),
                ]),
            )
            .listed()
            .filterable(),
        )
        .field(FieldConfig::new("created_at", "Reçu le", FieldKind::Date).listed().sortable())
        .status_field("status")
        .title_field("subject")
        .features(Features {
            bulk_actions: true,
            ..Features::default()
        })
        .row_actions(vec![RowAction::Edit, RowAction::Archive, RowAction::Delete])
        .bulk_actions(vec![BulkAction::Archive, BulkAction::Delete])
        .build()
}

/// Every admin page, in menu order.
pub fn all() -> Vec<ModelConfig> {
    vec![
        news(),
        projects(),
        tenders(),
        careers(),
        events(),
        publications(),
        users(),
        roles(),
        partners(),
        statistics(),
        audit_logs(),
        forms(),
    ]
}

pub fn find(name: &str) -> Option<ModelConfig> {
    all().into_iter().find(|m| m.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_models_have_unique_names() {
        let models = all();
        let mut names: Vec<_> = models.iter().map(|m| m.name.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), models.len());
    }

    #[test]
    fn test_default_sort_field_exists_or_is_timestamp() {
        for model in all() {
            let (field, _) = &model.default_sort;
            assert!(
                model.field(field).is_some() || field == "created_at",
                "{} sorts by unknown field {}",
                model.name,
                field
            );
        }
    }

    #[test]
    fn test_status_field_is_a_select() {
        for model in all() {
            if let Some(status) = model.status() {
                assert!(!status.kind.options().is_empty(), "{}", model.name);
            }
        }
    }

    #[test]
    fn test_forms_use_submissions_table() {
        let model = find("forms").unwrap();
        assert_eq!(model.table, "contact_submissions");
        assert!(find("nope").is_none());
    }

    #[test]
    fn test_audit_log_is_read_only() {
        let model = audit_logs();
        assert!(model.row_actions.is_empty());
    }
}
