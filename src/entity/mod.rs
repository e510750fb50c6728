pub mod order_items;
pub mod orders;
pub mod pickup_points;
pub mod products;
pub mod users;

pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use pickup_points::Entity as PickupPoints;
pub use products::Entity as Products;
pub use users::Entity as Users;
