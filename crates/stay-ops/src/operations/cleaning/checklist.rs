use super::domain::{ChecklistItem, ChecklistItemKind};

/// Template for one checklist entry.
#[derive(Debug, Clone)]
pub struct ChecklistTemplate {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ChecklistItemKind,
}

/// The checklist a freshly opened job starts from.
#[derive(Debug, Clone)]
pub struct ChecklistBlueprint {
    items: Vec<ChecklistTemplate>,
}

impl ChecklistBlueprint {
    pub fn standard() -> Self {
        let items = vec![
            ChecklistTemplate {
                key: "air_rooms",
                label: "Air out all rooms",
                kind: ChecklistItemKind::Standard,
            },
            ChecklistTemplate {
                key: "change_linens",
                label: "Change bed linens and towels",
                kind: ChecklistItemKind::Standard,
            },
            ChecklistTemplate {
                key: "clean_bathroom",
                label: "Clean and disinfect bathroom",
                kind: ChecklistItemKind::Standard,
            },
            ChecklistTemplate {
                key: "clean_kitchen",
                label: "Clean kitchen and empty fridge",
                kind: ChecklistItemKind::Standard,
            },
            ChecklistTemplate {
                key: "wash_floors",
                label: "Vacuum and wash floors",
                kind: ChecklistItemKind::Standard,
            },
            ChecklistTemplate {
                key: "empty_trash",
                label: "Empty trash and replace bags",
                kind: ChecklistItemKind::Standard,
            },
            ChecklistTemplate {
                key: "final_photos",
                label: "Take final photos of every room",
                kind: ChecklistItemKind::FinalPhotos,
            },
        ];
        Self { items }
    }

    pub fn items(&self) -> &[ChecklistTemplate] {
        &self.items
    }

    pub fn instantiate(&self) -> Vec<ChecklistItem> {
        self.items
            .iter()
            .map(|template| ChecklistItem {
                id: template.key.to_string(),
                label: template.label.to_string(),
                kind: template.kind,
                done: false,
            })
            .collect()
    }
}
