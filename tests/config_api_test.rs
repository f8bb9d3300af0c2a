// ==========================================
// ConfigApi 集成测试
// ==========================================
// 测试范围:
// 1. 配置读取: 无保存配置时回退默认值
// 2. 配置保存: revision 递增、乐观并发冲突、校验
// 3. 产线覆写: 读取/替换后立即生效
// ==========================================


use reglages_ligne::api::ApiError;
use reglages_ligne::domain::BlockLineOverride;
use reglages_ligne::engine::default_config::default_blocks;
use test_helpers::{block, field, TestEnv, OPERATOR};

#[tokio::test]
async fn test_load_configuration_默认配置() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let snapshot = env.state.config_api.load_configuration().await.expect("读取失败");
    assert!(snapshot.is_default);
    assert_eq!(snapshot.revision, 0);
    assert_eq!(snapshot.blocks, default_blocks());
}

#[tokio::test]
async fn test_save_configuration_revision递增() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let api = &env.state.config_api;

    let blocks = vec![block("b1", "four", 1, &["*"], vec![field("f1", "temperature", 1, &["*"])])];
    let first = api
        .save_configuration(Some(OPERATOR), blocks.clone(), Some(0))
        .await
        .expect("保存失败");
    assert_eq!(first.revision, 1);
    assert!(!first.is_default);

    let second = api
        .save_configuration(Some(OPERATOR), blocks, None)
        .await
        .expect("无 expectedRevision 的保存应直接覆盖");
    assert_eq!(second.revision, 2);

    let loaded = api.load_configuration().await.expect("读取失败");
    assert_eq!(loaded.revision, 2);
    assert_eq!(loaded.blocks[0].technical_name, "four");
}

#[tokio::test]
async fn test_save_configuration_版本冲突() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let api = &env.state.config_api;
    let blocks = default_blocks();

    api.save_configuration(Some(OPERATOR), blocks.clone(), Some(0))
        .await
        .expect("保存失败");

    let result = api.save_configuration(Some("paul"), blocks, Some(0)).await;
    match result {
        Err(ApiError::VersionConflict { expected, actual }) => {
            assert_eq!(expected, 0);
            assert_eq!(actual, 1);
        }
        other => panic!("应返回版本冲突, 实际: {:?}", other.map(|s| s.revision)),
    }
}

#[tokio::test]
async fn test_save_configuration_需要操作人() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let result = env
        .state
        .config_api
        .save_configuration(None, default_blocks(), None)
        .await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));

    let result = env
        .state
        .config_api
        .save_configuration(Some("  "), default_blocks(), None)
        .await;
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_save_configuration_技术名重复被拒绝() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let blocks = vec![
        block("b1", "four", 1, &["*"], vec![]),
        block("b2", "four", 2, &["*"], vec![]),
    ];

    let result = env
        .state
        .config_api
        .save_configuration(Some(OPERATOR), blocks, None)
        .await;
    assert!(matches!(result, Err(ApiError::ValidationError(_))));
    assert!(env.state.config_api.load_configuration().await.unwrap().is_default);
}

#[tokio::test]
async fn test_save_configuration_补齐技术名并整理order() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let mut legacy = block("b1", "", 7, &["*"], vec![field("f1", "", 5, &["*"])]);
    legacy.name = "Chambre froide".to_string();
    legacy.fields[0].name = "Température".to_string();

    let saved = env
        .state
        .config_api
        .save_configuration(Some(OPERATOR), vec![legacy], None)
        .await
        .expect("保存失败");

    assert_eq!(saved.blocks[0].technical_name, "chambre_froide");
    assert_eq!(saved.blocks[0].order, 1);
    assert_eq!(saved.blocks[0].fields[0].order, 1);
    assert!(!saved.blocks[0].fields[0].technical_name.is_empty());
}

#[tokio::test]
async fn test_reset_to_default() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let api = &env.state.config_api;

    api.save_configuration(Some(OPERATOR), vec![block("b1", "x", 1, &["*"], vec![])], None)
        .await
        .expect("保存失败");
    let reset = api
        .reset_to_default(Some(OPERATOR), Some(1))
        .await
        .expect("恢复默认失败");

    assert_eq!(reset.revision, 2);
    assert_eq!(reset.blocks, default_blocks());
}

#[tokio::test]
async fn test_visible_blocks_按产线过滤() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let api = &env.state.config_api;

    let line2 = api.visible_blocks(Some("2")).await.expect("查询失败");
    let ids: Vec<&str> = line2.iter().map(|b| b.id.as_str()).collect();
    assert!(!ids.contains(&"b_diviseuse"));
    assert!(!ids.contains(&"b_laminoir"));
    assert!(ids.contains(&"b_four"));

    // 字段同样按产线过滤
    let four = line2.iter().find(|b| b.id == "b_four").unwrap();
    assert!(four.fields.iter().all(|f| f.technical_name != "temperature_sole"));

    let all = api.visible_blocks(None).await.expect("查询失败");
    assert_eq!(all.len(), default_blocks().len());
    let orders: Vec<u32> = all.iter().map(|b| b.order).collect();
    let mut sorted = orders.clone();
    sorted.sort();
    assert_eq!(orders, sorted);
}

#[tokio::test]
async fn test_line_overrides_替换后立即生效() {
    let env = TestEnv::new().expect("无法创建测试环境");
    let api = &env.state.config_api;

    assert_eq!(api.line_overrides().await.unwrap().len(), 4);

    api.set_line_overrides(Some(OPERATOR), vec![BlockLineOverride::hidden_for("b_four", &["3"])])
        .await
        .expect("设置失败");

    let line3 = api.visible_blocks(Some("3")).await.unwrap();
    assert!(line3.iter().all(|b| b.id != "b_four"));
    let line4 = api.visible_blocks(Some("4")).await.unwrap();
    assert!(line4.iter().any(|b| b.id == "b_four"));

    assert!(matches!(
        api.set_line_overrides(None, Vec::new()).await,
        Err(ApiError::Unauthorized)
    ));
}
