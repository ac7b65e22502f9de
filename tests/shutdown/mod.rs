mod stop;
