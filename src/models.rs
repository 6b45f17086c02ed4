use serde::{Deserialize, Serialize};

/// Catalog item row, returned in full by search / 商品记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogItem {
    pub id: String,
    pub image: Option<String>,
    /// Vendor / brand / 品牌
    pub company: Option<String>,
    pub item_name: Option<String>,
    pub original_price: Option<f64>,
    pub current_price: Option<f64>,
    pub discount_percentage: Option<i64>,
    /// Days / 退货期限（天）
    pub return_period: Option<i64>,
    pub delivery_date: Option<String>,
    pub rating_stars: Option<f64>,
    pub rating_count: Option<i64>,
    pub category: Option<String>,
    /// Comma separated / 逗号分隔
    pub tags: Option<String>,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.item_name = Some(name.to_string());
        self
    }

    pub fn with_company(mut self, company: &str) -> Self {
        self.company = Some(company.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_tags(mut self, tags: &str) -> Self {
        self.tags = Some(tags.to_string());
        self
    }
}

/// Rating as found in seed files / 种子文件中的评分
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedRating {
    pub stars: Option<f64>,
    pub count: Option<i64>,
}

/// Item as found in seed files (rating nested) / 种子文件中的商品
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedItem {
    pub id: String,
    pub image: Option<String>,
    pub company: Option<String>,
    pub item_name: Option<String>,
    pub original_price: Option<f64>,
    pub current_price: Option<f64>,
    pub discount_percentage: Option<i64>,
    pub return_period: Option<i64>,
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub rating: Option<SeedRating>,
    pub category: Option<String>,
    pub tags: Option<String>,
}

impl From<SeedItem> for CatalogItem {
    fn from(it: SeedItem) -> Self {
        let rating = it.rating.unwrap_or_default();
        Self {
            id: it.id,
            image: it.image,
            company: it.company,
            item_name: it.item_name,
            original_price: it.original_price,
            current_price: it.current_price,
            discount_percentage: it.discount_percentage,
            return_period: it.return_period,
            delivery_date: it.delivery_date,
            rating_stars: rating.stars,
            rating_count: rating.count,
            category: it.category,
            tags: it.tags,
        }
    }
}

/// Seed file layout: `{"items": [[{...}, ...]]}` / 种子文件结构
#[derive(Debug, Clone, Deserialize)]
pub struct SeedFile {
    pub items: Vec<Vec<SeedItem>>,
}

impl SeedFile {
    pub fn into_items(self) -> Vec<CatalogItem> {
        self.items
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(CatalogItem::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_file_flattens_rating() {
        let raw = r#"{"items": [[
            {"id": "001", "company": "Carlton London", "item_name": "Rhodium-Plated Earrings",
             "current_price": 606, "rating": {"stars": 4.5, "count": 1400},
             "category": "jewellery", "tags": "earrings,women"},
            {"id": "002", "item_name": "Sandals"}
        ]]}"#;
        let items = serde_json::from_str::<SeedFile>(raw).unwrap().into_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].rating_stars, Some(4.5));
        assert_eq!(items[0].rating_count, Some(1400));
        assert_eq!(items[0].current_price, Some(606.0));
        assert_eq!(items[1].rating_stars, None);
    }

    #[test]
    fn test_seed_file_empty_outer_list() {
        let items = serde_json::from_str::<SeedFile>(r#"{"items": []}"#).unwrap().into_items();
        assert!(items.is_empty());
    }
}
