use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GarmentCategory {
    Tshirt,
    Shirt,
}

impl GarmentCategory {
    pub const ALL: [GarmentCategory; 2] = [GarmentCategory::Tshirt, GarmentCategory::Shirt];

    pub fn as_str(&self) -> &'static str {
        match self {
            GarmentCategory::Tshirt => "tshirt",
            GarmentCategory::Shirt => "shirt",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GarmentCategory::Tshirt => "T-Shirts",
            GarmentCategory::Shirt => "Shirts",
        }
    }
}

/// A catalog entry for a shirt model that can be customized or tried on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Garment {
    pub id: u64,
    pub name: String,
    pub category: GarmentCategory,
    /// Whole rupees, as shown in the storefront.
    pub price: u32,
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGarment {
    pub name: String,
    pub category: GarmentCategory,
    pub price: u32,
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub model_path: Option<String>,
}

impl NewGarment {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("garment name must not be empty".to_string()));
        }
        if self.image_url.trim().is_empty() {
            return Err(DomainError::InvalidInput("garment image URL must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn into_garment(self, id: u64) -> Garment {
        Garment {
            id,
            name: self.name,
            category: self.category,
            price: self.price,
            image_url: self.image_url,
            description: self.description,
            sizes: self.sizes,
            colors: self.colors,
            model_path: self.model_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub id: String,
    pub name: String,
    pub count: usize,
}

/// Counts per category, led by the "all" bucket.
pub fn category_counts(garments: &[Garment]) -> Vec<CategoryCount> {
    let mut counts = vec![CategoryCount {
        id: "all".to_string(),
        name: "All Items".to_string(),
        count: garments.len(),
    }];
    counts.extend(GarmentCategory::ALL.iter().map(|category| CategoryCount {
        id: category.as_str().to_string(),
        name: category.display_name().to_string(),
        count: garments.iter().filter(|g| g.category == *category).count(),
    }));
    counts
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// The collection a fresh catalog starts with.
pub fn seed_collection() -> Vec<Garment> {
    let items: [(&str, GarmentCategory, u32, &str, &str, &[&str], &[&str]); 6] = [
        (
            "Classic White T-Shirt",
            GarmentCategory::Tshirt,
            899,
            "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?w=400&h=400&fit=crop",
            "Premium cotton basic white tee",
            &["S", "M", "L", "XL"],
            &["white", "black", "gray", "navy"],
        ),
        (
            "Blue Denim Shirt",
            GarmentCategory::Shirt,
            1899,
            "https://images.unsplash.com/photo-1596755094514-f87e34085b2c?w=400&h=400&fit=crop",
            "Casual denim button-down shirt",
            &["S", "M", "L", "XL"],
            &["blue", "black", "white"],
        ),
        (
            "Graphic Print Tee",
            GarmentCategory::Tshirt,
            1299,
            "https://images.unsplash.com/photo-1583743814966-8936f37f4dta?w=400&h=400&fit=crop",
            "Trendy graphic printed t-shirt",
            &["S", "M", "L", "XL"],
            &["black", "white", "gray"],
        ),
        (
            "Formal White Shirt",
            GarmentCategory::Shirt,
            2499,
            "https://images.unsplash.com/photo-1602810318383-e386cc2a3ccf?w=400&h=400&fit=crop",
            "Crisp formal white dress shirt",
            &["S", "M", "L", "XL", "XXL"],
            &["white", "light blue", "pink"],
        ),
        (
            "Striped Polo Shirt",
            GarmentCategory::Shirt,
            1799,
            "https://images.unsplash.com/photo-1618354691373-d851c5c3a990?w=400&h=400&fit=crop",
            "Classic striped polo shirt",
            &["S", "M", "L", "XL"],
            &["navy", "white", "red"],
        ),
        (
            "Vintage Band Tee",
            GarmentCategory::Tshirt,
            1599,
            "https://images.unsplash.com/photo-1503341338740-0c7c1e0e4e49?w=400&h=400&fit=crop",
            "Retro vintage band t-shirt",
            &["S", "M", "L", "XL"],
            &["black", "gray", "white"],
        ),
    ];

    items
        .iter()
        .enumerate()
        .map(|(i, (name, category, price, image_url, description, size_list, color_list))| Garment {
            id: i as u64 + 1,
            name: name.to_string(),
            category: *category,
            price: *price,
            image_url: image_url.to_string(),
            description: description.to_string(),
            sizes: strings(size_list),
            colors: strings(color_list),
            model_path: None,
        })
        .collect()
}
