//! Product fixtures shared by unit tests.

use rust_decimal::Decimal;

use crate::types::{
    ColorId, ColorOption, ImageId, ImageKey, Product, ProductId, SizeId, SizeOption, Variant,
    VariantId, VariantImage,
};

pub const RED: ColorId = ColorId::new(1);
pub const BLUE: ColorId = ColorId::new(2);
pub const GREEN: ColorId = ColorId::new(3);
pub const SMALL: SizeId = SizeId::new(10);
pub const MEDIUM: SizeId = SizeId::new(11);
pub const LARGE: SizeId = SizeId::new(12);

pub fn color(id: ColorId, name: &str, display_order: Option<i32>) -> ColorOption {
    ColorOption {
        id,
        name: name.to_string(),
        display_order,
        hex_code: None,
    }
}

pub fn size(id: SizeId, name: &str, display_order: Option<i32>) -> SizeOption {
    SizeOption {
        id,
        name: name.to_string(),
        display_order,
    }
}

pub fn variant(id: i64, color: Option<ColorId>, size: Option<SizeId>, quantity: i64) -> Variant {
    Variant {
        id: VariantId::new(id),
        product_id: ProductId::new(1),
        color_id: color,
        size_id: size,
        sku: None,
        price: Decimal::from(25),
        sale_price: None,
        quantity,
        is_active: true,
        images: Vec::new(),
    }
}

pub fn product(colors: Vec<ColorOption>, sizes: Vec<SizeOption>, variants: Vec<Variant>) -> Product {
    Product {
        id: ProductId::new(1),
        name: "Oxford Shirt".to_string(),
        slug: "oxford-shirt".to_string(),
        description: String::new(),
        price: Decimal::from(25),
        sale_price: None,
        category_id: None,
        is_active: true,
        colors,
        sizes,
        variants,
    }
}

/// Colors {Red, Blue}, sizes {S, M}, variants {(Red,S), (Blue,M)}.
pub fn red_blue_product() -> Product {
    product(
        vec![color(RED, "Red", Some(1)), color(BLUE, "Blue", Some(2))],
        vec![size(SMALL, "S", Some(1)), size(MEDIUM, "M", Some(2))],
        vec![
            variant(100, Some(RED), Some(SMALL), 5),
            variant(101, Some(BLUE), Some(MEDIUM), 5),
        ],
    )
}

pub fn image(id: i64, order: u32, is_primary: bool) -> VariantImage {
    VariantImage {
        id: ImageKey::Persisted(ImageId::new(id)),
        url: format!("variants/{id}.jpg"),
        alt_text: None,
        is_primary,
        order,
    }
}

/// Images with ids `1..=n`, orders `0..n`, the first one primary.
pub fn images(n: u32) -> Vec<VariantImage> {
    (0..n)
        .map(|order| image(i64::from(order) + 1, order, order == 0))
        .collect()
}
