use sea_orm::entity::prelude::*;

// Timeline, rating and cancellation are flattened into nullable columns;
// the API model regroups them into their nested shapes.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub status: String,

    // Pricing snapshot, cents. Written once at creation, never recomputed.
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub service_fee: i64,
    pub taxes: i64,
    pub total: i64,

    pub payment_method: String,
    pub payment_status: String,

    pub fulfillment: String,
    pub delivery_address: Option<Json>,
    pub delivery_instructions: Option<String>,
    pub scheduled_time: Option<DateTimeWithTimeZone>,
    pub estimated_delivery: DateTimeWithTimeZone,
    pub actual_delivery: Option<DateTimeWithTimeZone>,

    pub placed_at: DateTimeWithTimeZone,
    pub confirmed_at: Option<DateTimeWithTimeZone>,
    pub preparing_at: Option<DateTimeWithTimeZone>,
    pub ready_at: Option<DateTimeWithTimeZone>,
    pub delivering_at: Option<DateTimeWithTimeZone>,
    pub delivered_at: Option<DateTimeWithTimeZone>,
    pub cancelled_at: Option<DateTimeWithTimeZone>,

    pub rating_food: Option<i16>,
    pub rating_delivery: Option<i16>,
    pub rating_overall: Option<i16>,
    pub rating_comment: Option<String>,
    pub rated_at: Option<DateTimeWithTimeZone>,

    pub cancel_reason: Option<String>,
    pub cancelled_by: Option<String>,
    pub refund_amount: Option<i64>,
    pub refund_status: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CustomerId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::vendors::Entity",
        from = "Column::VendorId",
        to = "super::vendors::Column::Id"
    )]
    Vendors,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::vendors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendors.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
