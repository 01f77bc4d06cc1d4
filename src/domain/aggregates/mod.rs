//! Aggregates module
pub mod product;
pub mod order;
pub mod bag;
pub mod profile;
pub mod news;

pub use product::{search_catalog, CatalogError, CatalogListing, Category, Product, ProductForm, ProductQuery, ProductReview, ReviewForm};
pub use order::{Order, OrderError, OrderForm, OrderLineItem};
pub use bag::{Bag, BagChange, BagContents, BagError, BagLine};
pub use profile::{ProfileForm, RegistrationForm, User, UserProfile};
pub use news::{News, NewsFilter, NewsForm, NewsStatus, NewsSummary};
