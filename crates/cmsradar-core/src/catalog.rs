//! 内置规则目录（纯数据，无逻辑）
//!
//! 四类信号表 + 版本提取表，全部以声明式数据表示：
//! - 扩展新平台只需追加表项，匹配逻辑在 `extract.rs` 中统一迭代执行；
//! - 表的顺序即求值顺序，影响 reasons 的排列，但不影响最终得分。

/// generator meta 标签关键词 → 平台名（content 小写后做包含判断）
pub(crate) const GENERATOR_KEYWORDS: &[(&str, &str)] = &[
    ("wordpress", "WordPress"),
    ("joomla", "Joomla"),
    ("drupal", "Drupal"),
    ("typo3", "TYPO3"),
    ("contao", "Contao"),
    ("ghost", "Ghost"),
    ("craft cms", "Craft CMS"),
    ("modx", "MODX"),
    ("prestashop", "PrestaShop"),
    ("magento", "Magento"),
];

/// generator 命中的权重与原因
pub(crate) const GENERATOR_WEIGHT: u32 = 80;
pub(crate) const GENERATOR_REASON: &str = "Generator-Tag";

/// `x-powered-by` 头关键词 → 平台名（权重 50）
pub(crate) const X_POWERED_BY_SIGNALS: &[(&str, &str)] = &[
    ("wp", "WordPress"),
    ("shopify", "Shopify"),
    ("wix", "Wix"),
    ("craft cms", "Craft CMS"),
    ("prestashop", "PrestaShop"),
];
pub(crate) const X_POWERED_BY_WEIGHT: u32 = 50;
pub(crate) const X_POWERED_BY_REASON: &str = "x-powered-by Header";

/// `server` 头关键词：单条规则，任一命中只产生一个 Shopify 弱提示（权重 20）
pub(crate) const SERVER_NEEDLES: &[&str] = &["cloudflare", "shopify"];
pub(crate) const SERVER_TARGET: &str = "Shopify";
pub(crate) const SERVER_WEIGHT: u32 = 20;
pub(crate) const SERVER_REASON: &str = "Server Header Hinweis";

/// `x-generator` 头关键词 → 平台名（权重 70）
pub(crate) const X_GENERATOR_SIGNALS: &[(&str, &str)] = &[
    ("drupal", "Drupal"),
    ("craft cms", "Craft CMS"),
];
pub(crate) const X_GENERATOR_WEIGHT: u32 = 70;
pub(crate) const X_GENERATOR_REASON: &str = "x-generator Header";

/// 路径/资源规则表项
#[derive(Debug, Clone)]
pub struct PathRule {
    pub cms: String,
    pub pattern: String,
    pub weight: u32,
    pub reason: String,
}

/// 内置路径/资源规则（每条编译为一个大小写不敏感正则，存在性判定，单次命中）
pub(crate) const PATH_RULES: &[(&str, &str, u32, &str)] = &[
    ("WordPress", r"wp-content|wp-includes", 80, "WordPress-path found"),
    ("Shopify", r"cdn\.shopify\.com|Shopify\.theme|storefront", 80, "Shopify CDN found"),
    ("Wix", r"wixsite|static\.wixstatic\.com", 80, "Wix-specific assets found"),
    ("Drupal", r"drupal-settings-json|/sites/default/files", 70, "Drupal settings found"),
    ("TYPO3", r"typo3conf|typo3temp|/typo3/", 70, "TYPO3-path found"),
    ("Joomla", r"/components/com_|/media/jui/|Joomla!", 70, "Joomla-path found"),
    ("Contao", r"/assets/contao|contao-", 70, "Contao-path found"),
    ("Ghost", r"/ghost/api/|ghost-sdk|data-ghost", 70, "Ghost-path found"),
    ("Craft CMS", r"/cpresources/|craftcms", 70, "Craft-CMS-path found"),
    ("Magento", r"/static/version\d+/frontend/|Magento_|mage/cookies", 70, "Magento-path found"),
    ("PrestaShop", r"/modules/ps_|prestashop", 70, "PrestaShop-path found"),
    ("OpenCart", r"catalog/view/theme|index\.php\?route=", 70, "OpenCart-path found"),
    ("MODX", r"/assets/components/|modx", 70, "MODX-path found"),
    ("Kirby", r"/kirby/|kirbytext", 60, "Kirby-path found"),
    ("Statamic", r"/statamic/|statamic", 60, "Statamic-path found"),
    ("Umbraco", r"/umbraco/|umbraco", 70, "Umbraco-path found"),
    ("Sitecore", r"/sitecore/|sc_site=", 70, "Sitecore-path found"),
    ("SilverStripe", r"silverstripe|/_resources/", 70, "SilverStripe-path found"),
    ("Concrete CMS", r"concrete5|/concrete/|ccm_", 70, "Concrete-CMS-path found"),
    ("October CMS", r"october_session|/modules/system/assets", 70, "October-CMS-path found"),
    ("Grav", r"grav-theme|/user/themes/", 60, "Grav-path found"),
    ("Squarespace", r"squarespace\.com|static1\.squarespace", 70, "Squarespace assets found"),
    ("Webflow", r"webflow\.js|w-nav", 70, "Webflow patterns found"),
];

/// JS 框架兜底信号（权重 30，明确标注为非传统 CMS，避免压过真正的 CMS 命中）
pub(crate) const JS_FALLBACK_RULES: &[(&str, &str, &str)] = &[
    (r"__NEXT_DATA__", "Next.js (not a traditional CMS)", "Next.js JSON Payload"),
    (r#"<div id=["']__nuxt"#, "Nuxt.js (not a traditional CMS)", "Nuxt Root Element"),
    (r#"id=["']___gatsby"#, "Gatsby (not a traditional CMS)", "Gatsby Root Element"),
];
pub(crate) const JS_FALLBACK_WEIGHT: u32 = 30;

/// 按平台归类的版本提取规则：每个平台一组有序模式，首个命中即胜出。
/// 模式必须包含捕获组 1（版本号本体）；无命中时版本保持缺省，不是错误。
pub(crate) const VERSION_RULES: &[(&str, &[&str])] = &[
    (
        "WordPress",
        &[
            // generator 标签后缀（属性顺序无关，赢家已确定，直接取名字后的数字）
            r"(?i)\bWordPress\s+([0-9]+(?:\.[0-9]+)*)",
            // 资源 URL 的版本参数（如 style.css?ver=6.4.2）
            r"(?i)\?ver=([0-9]+(?:\.[0-9]+)+)",
        ],
    ),
    ("Drupal", &[r"(?i)\bDrupal\s+([0-9]+(?:\.[0-9]+)*)"]),
    ("Joomla", &[r"(?i)\bJoomla!?\s+([0-9]+(?:\.[0-9]+)*)"]),
    ("TYPO3", &[r"(?i)\bTYPO3\s+(?:CMS\s+)?([0-9]+(?:\.[0-9]+)*)"]),
    ("Ghost", &[r"(?i)\bGhost\s+([0-9]+(?:\.[0-9]+)*)"]),
    ("Shopify", &[r#""theme_version"\s*:\s*"([^"]+)""#]),
    ("PrestaShop", &[r#"(?i)"version"\s*:\s*"([0-9]+(?:\.[0-9]+)*)""#]),
];
