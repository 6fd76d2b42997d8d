mod test_toggles;
