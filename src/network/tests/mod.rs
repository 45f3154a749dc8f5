mod graph_property_tests;
mod community_property_tests;
