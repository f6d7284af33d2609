use crate::models::CatalogItem;

fn item(code: &str, title: &str, description: &str, download: &str) -> CatalogItem {
    CatalogItem {
        code: code.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        download: download.to_string(),
    }
}

/// The installable applications, in display order
pub fn catalog() -> Vec<CatalogItem> {
    vec![
        item(
            "0",
            "retro_turbogame",
            "Browser racing game with a retro look.",
            "NyanthuUtillSoft/releases/download/v1.02/1.1.1.2.html",
        ),
        item(
            "1",
            "NyanthuGame(Mac)",
            "Block exploration game for macOS.",
            "NyanthuGame/releases/download/v1.01/game.zip",
        ),
        item(
            "2",
            "NyanthuNetSoft",
            "Small networking utilities.",
            "NyanthuNetSoft/releases/download/v1.01/netsoft.zip",
        ),
        item(
            "3",
            "NyanthuCoin",
            "Toy coin ledger.",
            "NyanthuCoin/releases/download/v1.01/coin.zip",
        ),
    ]
}

pub fn find_item(code: &str) -> Option<CatalogItem> {
    catalog().into_iter().find(|item| item.code == code)
}

/// Full download location of `item` under `base_url`
pub fn download_url(base_url: &str, item: &CatalogItem) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), item.download.trim_start_matches('/'))
}
