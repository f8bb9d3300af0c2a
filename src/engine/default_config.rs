// ==========================================
// 面包生产线设定系统 - 内置默认配置
// ==========================================
// 用途: 配置存储中没有已保存配置时的回退值
// 要求: 每次调用返回完全相同的列表
// ==========================================

use crate::domain::block::{Block, Field};
use crate::domain::types::BlockLineOverride;

/// 工位组区块 id（历史产线例外涉及的四个区块）
pub mod station_blocks {
    pub const DIVISEUSE: &str = "b_diviseuse";
    pub const BOULEUSE: &str = "b_bouleuse";
    pub const LAMINOIR: &str = "b_laminoir";
    pub const FACONNEUSE: &str = "b_faconneuse";
}

/// 历史产线例外：分割机/搓圆机在 2、5 线隐藏；压面机/成型机仅在 1、4、6 线显示
pub fn default_line_overrides() -> Vec<BlockLineOverride> {
    vec![
        BlockLineOverride::hidden_for(station_blocks::DIVISEUSE, &["2", "5"]),
        BlockLineOverride::hidden_for(station_blocks::BOULEUSE, &["2", "5"]),
        BlockLineOverride::only_for(station_blocks::LAMINOIR, &["1", "4", "6"]),
        BlockLineOverride::only_for(station_blocks::FACONNEUSE, &["1", "4", "6"]),
    ]
}

/// 内置默认区块列表
pub fn default_blocks() -> Vec<Block> {
    vec![
        block(
            "b_general",
            "Informations générales",
            "informations_generales",
            1,
            &["*"],
            vec![
                field("f_poids_paton", "Poids pâton (g)", "poids_paton", 1, &["*"]),
                field("f_cadence", "Cadence (pièces/min)", "cadence", 2, &["*"]),
                field("f_hydratation", "Hydratation (%)", "hydratation", 3, &["*"]),
            ],
        ),
        block(
            station_blocks::DIVISEUSE,
            "Diviseuse",
            "diviseuse",
            2,
            &["1", "3", "4", "6"],
            vec![
                field("f_volume_chambre", "Volume chambre", "volume_chambre", 1, &["*"]),
                field("f_vitesse_diviseuse", "Vitesse diviseuse", "vitesse_diviseuse", 2, &["*"]),
            ],
        ),
        block(
            station_blocks::BOULEUSE,
            "Bouleuse",
            "bouleuse",
            3,
            &["1", "3", "4", "6"],
            vec![
                field("f_vitesse_bouleuse", "Vitesse bouleuse", "vitesse_bouleuse", 1, &["*"]),
                field("f_farinage_bouleuse", "Farinage", "farinage_bouleuse", 2, &["*"]),
            ],
        ),
        block(
            station_blocks::LAMINOIR,
            "Laminoir",
            "laminoir",
            4,
            &["1", "4", "6"],
            vec![
                field("f_ecartement_cylindres", "Écartement cylindres (mm)", "ecartement_cylindres", 1, &["*"]),
                field("f_vitesse_laminoir", "Vitesse laminoir", "vitesse_laminoir", 2, &["*"]),
            ],
        ),
        block(
            station_blocks::FACONNEUSE,
            "Façonneuse",
            "faconneuse",
            5,
            &["1", "4", "6"],
            vec![
                field("f_pression_faconnage", "Pression façonnage", "pression_faconnage", 1, &["*"]),
                field("f_longueur_paton", "Longueur pâton (cm)", "longueur_paton", 2, &["1", "4"]),
            ],
        ),
        block(
            "b_fermentation",
            "Chambre de fermentation",
            "fermentation",
            6,
            &["*"],
            vec![
                field("f_temperature_fermentation", "Température (°C)", "temperature_fermentation", 1, &["*"]),
                field("f_humidite_fermentation", "Humidité (%)", "humidite_fermentation", 2, &["*"]),
                field("f_duree_fermentation", "Durée (min)", "duree_fermentation", 3, &["*"]),
            ],
        ),
        block(
            "b_four",
            "Four",
            "four",
            7,
            &["*"],
            vec![
                field("f_temperature_four", "Température (°C)", "temperature_four", 1, &["*"]),
                field("f_duree_cuisson", "Durée cuisson (min)", "duree_cuisson", 2, &["*"]),
                field("f_buee", "Buée (s)", "buee", 3, &["*"]),
                field("f_temperature_sole", "Température sole (°C)", "temperature_sole", 4, &["4", "6"]),
            ],
        ),
        block(
            "b_surgelation",
            "Surgélation",
            "surgelation",
            8,
            &["*"],
            vec![
                field("f_temperature_surgelation", "Température (°C)", "temperature_surgelation", 1, &["*"]),
                field("f_duree_surgelation", "Durée (min)", "duree_surgelation", 2, &["*"]),
            ],
        ),
        block(
            "b_emballage",
            "Emballage",
            "emballage",
            9,
            &["*"],
            vec![
                field("f_type_sachet", "Type de sachet", "type_sachet", 1, &["*"]),
                field("f_pieces_sachet", "Pièces par sachet", "pieces_sachet", 2, &["*"]),
            ],
        ),
    ]
}

fn lines(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn block(
    id: &str,
    name: &str,
    technical_name: &str,
    order: u32,
    applicable_lines: &[&str],
    fields: Vec<Field>,
) -> Block {
    Block {
        id: id.to_string(),
        name: name.to_string(),
        technical_name: technical_name.to_string(),
        order,
        applicable_lines: lines(applicable_lines),
        visible: true,
        fields,
    }
}

fn field(id: &str, name: &str, technical_name: &str, order: u32, applicable_lines: &[&str]) -> Field {
    Field {
        id: id.to_string(),
        name: name.to_string(),
        technical_name: technical_name.to_string(),
        order,
        applicable_lines: lines(applicable_lines),
        visible: true,
    }
}
