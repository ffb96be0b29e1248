//! Canned data served by the stub service.

use serde_json::{Value, json};

/// Products served from `/Products`.
pub fn products() -> Vec<Value> {
    vec![
        json!({"ID": 1, "Name": "Bread", "Price": 2.5}),
        json!({"ID": 2, "Name": "Milk", "Price": 3.5}),
        json!({"ID": 3, "Name": "Vint soda", "Price": 20.9}),
    ]
}

/// `$metadata` with a derived entity type.
pub const METADATA_WITH_DERIVED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">
  <edmx:DataServices>
    <Schema Namespace="ODataDemo" xmlns="http://docs.oasis-open.org/odata/ns/edm">
      <EntityType Name="Product">
        <Key><PropertyRef Name="ID"/></Key>
        <Property Name="ID" Type="Edm.Int32" Nullable="false"/>
        <Property Name="Name" Type="Edm.String"/>
      </EntityType>
      <EntityType Name="FeaturedProduct" BaseType="ODataDemo.Product"/>
      <EntityContainer Name="DemoService">
        <EntitySet Name="Products" EntityType="ODataDemo.Product"/>
      </EntityContainer>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;

/// `$metadata` without derived types.
pub const METADATA_PLAIN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">
  <edmx:DataServices>
    <Schema Namespace="Plain" xmlns="http://docs.oasis-open.org/odata/ns/edm">
      <EntityType Name="Product">
        <Key><PropertyRef Name="ID"/></Key>
        <Property Name="ID" Type="Edm.Int32" Nullable="false"/>
      </EntityType>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;

/// Products keyed by `ProductID` rather than `ID`.
pub fn products_by_product_id() -> Vec<Value> {
    vec![
        json!({"ProductID": 7, "Name": "Bread"}),
        json!({"ProductID": 8, "Name": "Milk"}),
    ]
}

/// `$metadata` whose `Products` entity set is keyed by `ProductID`. The
/// namespace is single-quoted and a commented-out schema precedes the real
/// one.
pub const METADATA_PRODUCT_ID: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<edmx:Edmx Version='4.0' xmlns:edmx='http://docs.oasis-open.org/odata/ns/edmx'>
  <edmx:DataServices>
    <!-- <Schema Namespace="Legacy"><EntityType Name="Old" BaseType="Legacy.Thing"/></Schema> -->
    <Schema Namespace='Keyed' xmlns='http://docs.oasis-open.org/odata/ns/edm'>
      <EntityType Name='Product'>
        <Key><PropertyRef Name='ProductID'/></Key>
        <Property Name='ProductID' Type='Edm.Int32' Nullable='false'/>
        <Property Name='Name' Type='Edm.String'/>
      </EntityType>
      <EntityContainer Name='KeyedService'>
        <EntitySet Name='Products' EntityType='Keyed.Product'/>
      </EntityContainer>
    </Schema>
  </edmx:DataServices>
</edmx:Edmx>"#;
