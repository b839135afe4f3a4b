mod basic_tests;
